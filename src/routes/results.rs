//! Stored analysis results.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use crate::models::{AppState, ListResultsParams, ResultListResponse, ResultResponse};
use crate::types::{AppError, AppResult};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/results", get(list_results))
        .route("/results/{session_id}", get(get_result))
}

async fn list_results(
    State(state): State<AppState>,
    Query(params): Query<ListResultsParams>,
) -> AppResult<Json<ResultListResponse>> {
    let results = state
        .store
        .list(params.limit)
        .await
        .map_err(|e| AppError::Internal(format!("Error getting results: {}", e)))?;

    Ok(Json(ResultListResponse {
        status: "success".to_string(),
        count: results.len(),
        results,
    }))
}

async fn get_result(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<ResultResponse>> {
    let result = state
        .store
        .get(&session_id)
        .await
        .map_err(|e| AppError::Internal(format!("Error getting result: {}", e)))?
        .ok_or_else(|| AppError::NotFound("Result not found for this session ID".to_string()))?;

    Ok(Json(ResultResponse {
        status: "success".to_string(),
        result,
    }))
}
