use std::sync::Arc;

use crate::config::Config;
use crate::db::ResultStore;
use crate::queue::JobQueue;
use crate::storage::LocalStorage;

/// Query used when the client submits a blank one.
pub const DEFAULT_QUERY: &str = "Analyze this financial document for investment insights";

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ResultStore>,
    pub queue: Arc<dyn JobQueue>,
    pub storage: LocalStorage,
}

/// One persisted analysis, keyed by session.
// FromRow is needed for runtime query_as (no DATABASE_URL at compile time)
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct AnalysisResult {
    pub id: uuid::Uuid,
    pub session_id: String,
    pub query: String,
    pub filename: String,
    pub output: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// API Request/Response types

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct RootResponse {
    pub message: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub database: String,
    pub broker: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct AnalyzeResponse {
    pub status: String,
    pub task_id: uuid::Uuid,
    pub session_id: String,
    pub query: String,
    pub file_processed: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct TaskStatusResponse {
    pub state: crate::queue::TaskState,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct ListResultsParams {
    pub limit: Option<usize>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ResultListResponse {
    pub status: String,
    pub count: usize,
    pub results: Vec<AnalysisResult>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ResultResponse {
    pub status: String,
    pub result: AnalysisResult,
}
