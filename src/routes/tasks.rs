//! Task status polling.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::models::{AppState, TaskStatusResponse};
use crate::queue::{TaskRecord, TaskState};
use crate::types::{AppError, AppResult};

pub fn router() -> Router<AppState> {
    Router::new().route("/task/{task_id}", get(get_task_status))
}

async fn get_task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> AppResult<Json<TaskStatusResponse>> {
    // Ids the broker could never have issued are simply unknown, i.e. pending.
    let record = match Uuid::parse_str(&task_id) {
        Ok(id) => state
            .queue
            .task_state(id)
            .await
            .map_err(|e| AppError::Internal(format!("Error getting task status: {}", e)))?,
        Err(_) => TaskRecord::pending(Uuid::nil()),
    };

    Ok(Json(status_response(&record)))
}

pub fn status_response(record: &TaskRecord) -> TaskStatusResponse {
    let mut response = TaskStatusResponse {
        state: record.state,
        status: String::new(),
        session_id: None,
        result: None,
        error: None,
    };

    match record.state {
        TaskState::Pending => {
            response.status = "Task is pending...".to_string();
        }
        TaskState::Progress => {
            response.status = record
                .progress_message()
                .unwrap_or("Processing...")
                .to_string();
            response.session_id = record.session_id().map(String::from);
        }
        TaskState::Success => {
            response.status = "Task completed successfully".to_string();
            response.result = record.info.clone();
        }
        TaskState::Failure => {
            response.status = "Task failed".to_string();
            response.error = Some(record.error_message().unwrap_or("Unknown error").to_string());
            response.result = record.info.clone();
        }
    }

    response
}
