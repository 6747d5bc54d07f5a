use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use crate::config::DatabaseConfig;
use crate::models::AnalysisResult;
use crate::types::AppResult;
use anyhow::Result;

pub use memory::*;
pub use operations::*;
pub use pool::*;

pub mod memory;
pub mod operations;
pub mod pool;

/// Persistence for finished analyses.
///
/// At most one record exists per `session_id`; a second `save` for the same
/// session fails with [`crate::types::AppError::Conflict`].
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Insert a new record and return its id.
    async fn save(
        &self,
        session_id: &str,
        query: &str,
        output: &str,
        filename: &str,
    ) -> AppResult<uuid::Uuid>;

    async fn get(&self, session_id: &str) -> AppResult<Option<AnalysisResult>>;

    /// Most recent first. `None` lists everything.
    async fn list(&self, limit: Option<usize>) -> AppResult<Vec<AnalysisResult>>;

    async fn ping(&self) -> AppResult<()>;
}

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    if config.url.is_empty() {
        anyhow::bail!("DATABASE_URL must be set");
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect(&config.url)
        .await?;

    // Test connection
    sqlx::query("SELECT 1")
        .fetch_one(&pool)
        .await?;

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))
}
