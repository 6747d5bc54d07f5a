use axum::{extract::State, routing::get, Json, Router};
use tracing::warn;

use crate::models::{AppState, HealthResponse, RootResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Financial Document Analyzer API is running".to_string(),
    })
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.store.ping().await {
        Ok(()) => "connected".to_string(),
        Err(e) => {
            warn!(error = %e, "Result store health check failed");
            "unavailable".to_string()
        }
    };

    let broker = match state.queue.ping().await {
        Ok(()) => "connected".to_string(),
        Err(e) => {
            warn!(error = %e, "Broker health check failed");
            "unavailable".to_string()
        }
    };

    let status = if database == "connected" && broker == "connected" {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        database,
        broker,
    })
}
