use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{health_check, ResultStore};
use crate::models::AnalysisResult;
use crate::types::{AppError, AppResult};

/// Postgres-backed result store (`analysis_results` table).
#[derive(Clone)]
pub struct PgResultStore {
    pool: PgPool,
}

impl PgResultStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResultStore for PgResultStore {
    async fn save(
        &self,
        session_id: &str,
        query: &str,
        output: &str,
        filename: &str,
    ) -> AppResult<Uuid> {
        let id = Uuid::new_v4();

        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO analysis_results (id, session_id, query, filename, output, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(session_id)
        .bind(query)
        .bind(filename)
        .bind(output)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(format!(
                "A result for session {} already exists",
                session_id
            )),
            other => AppError::Database(other),
        })?;

        tracing::debug!(session_id, result_id = %inserted, "Analysis result stored");
        Ok(inserted)
    }

    async fn get(&self, session_id: &str) -> AppResult<Option<AnalysisResult>> {
        let result = sqlx::query_as::<_, AnalysisResult>(
            r#"
            SELECT id, session_id, query, filename, output, created_at
            FROM analysis_results
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    async fn list(&self, limit: Option<usize>) -> AppResult<Vec<AnalysisResult>> {
        // LIMIT NULL is LIMIT ALL in Postgres
        let limit = limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));

        let results = sqlx::query_as::<_, AnalysisResult>(
            r#"
            SELECT id, session_id, query, filename, output, created_at
            FROM analysis_results
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    async fn ping(&self) -> AppResult<()> {
        health_check(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| AppError::Internal(format!("database unreachable: {}", e)))
    }
}
