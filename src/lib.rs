// Financial Document Analyzer - queued multi-agent analysis of uploaded financial documents

pub mod config;
pub mod db;
pub mod models;
pub mod types;
pub mod agents;
pub mod llm;
pub mod search;    // Web search (SerpAPI Google engine)
pub mod tools;     // Document reader and text analyzers used by the agents
pub mod storage;
pub mod routes;
pub mod middleware;
pub mod queue;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
// Note: Import specific items from types module instead of glob to avoid name conflicts
// e.g., use findoc_analyzer::types::{AppError, AppResult};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
