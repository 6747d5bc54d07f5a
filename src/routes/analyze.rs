//! Document upload endpoint.

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{AnalyzeResponse, AppState, DEFAULT_QUERY};
use crate::queue::AnalysisJob;
use crate::types::{AppError, AppResult};

pub fn router() -> Router<AppState> {
    Router::new().route("/analyze", post(analyze_document))
}

struct Upload {
    filename: String,
    data: Bytes,
}

/// Blank or missing queries fall back to [`DEFAULT_QUERY`].
pub fn normalize_query(query: Option<&str>) -> String {
    match query.map(str::trim) {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => DEFAULT_QUERY.to_string(),
    }
}

async fn analyze_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<AnalyzeResponse>> {
    let mut upload: Option<Upload> = None;
    let mut query: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
    {
        match field.name().unwrap_or_default() {
            "file" => {
                let filename = field.file_name().unwrap_or("document.pdf").to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::InvalidRequest(format!("Failed to read uploaded file: {}", e))
                })?;
                upload = Some(Upload { filename, data });
            }
            "query" => {
                query = Some(field.text().await.map_err(|e| {
                    AppError::InvalidRequest(format!("Failed to read query: {}", e))
                })?);
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| AppError::InvalidRequest("No file provided".to_string()))?;
    let query = normalize_query(query.as_deref());
    let session_id = Uuid::new_v4().to_string();

    let file_path = state
        .storage
        .save_upload(&session_id, &upload.data)
        .await
        .map_err(|e| {
            error!(session_id = %session_id, error = %e, "Failed to store upload");
            AppError::Internal(format!("Error processing financial document: {}", e))
        })?;

    let job = AnalysisJob::new(
        session_id.clone(),
        query.clone(),
        file_path.to_string_lossy(),
        upload.filename.clone(),
    );

    if let Err(e) = state.queue.enqueue(&job).await {
        error!(session_id = %session_id, error = %e, "Failed to enqueue analysis job");
        state.storage.remove_upload(&file_path).await;
        return Err(AppError::Internal(format!(
            "Error processing financial document: {}",
            e
        )));
    }

    info!(
        task_id = %job.task_id,
        session_id = %session_id,
        filename = %upload.filename,
        bytes = upload.data.len(),
        "Analysis job submitted"
    );

    Ok(Json(AnalyzeResponse {
        status: "processing".to_string(),
        task_id: job.task_id,
        session_id,
        query,
        file_processed: upload.filename,
    }))
}
