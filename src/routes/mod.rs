//! API Routes
//!
//! - `GET /` - Liveness message
//! - `GET /health` - Store and broker reachability
//! - `POST /analyze` - Upload a document and queue its analysis
//! - `GET /task/{task_id}` - Poll a queued analysis
//! - `GET /results`, `GET /results/{session_id}` - Stored analyses

pub mod analyze;
pub mod health;
pub mod results;
pub mod tasks;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::apply_cors;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let body_limit = state.config.server.max_upload_bytes;
    let server_config = state.config.server.clone();

    let router = Router::new()
        .merge(health::router())
        .merge(analyze::router())
        .merge(tasks::router())
        .merge(results::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    apply_cors(router, &server_config)
}
