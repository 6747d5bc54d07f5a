use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::ResultStore;
use crate::models::AnalysisResult;
use crate::types::{AppError, AppResult};

/// Process-local result store for tests and single-process development.
#[derive(Clone, Default)]
pub struct InMemoryResultStore {
    // insertion order
    inner: Arc<RwLock<Vec<AnalysisResult>>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn save(
        &self,
        session_id: &str,
        query: &str,
        output: &str,
        filename: &str,
    ) -> AppResult<Uuid> {
        let mut guard = self.inner.write().await;
        if guard.iter().any(|r| r.session_id == session_id) {
            return Err(AppError::Conflict(format!(
                "A result for session {} already exists",
                session_id
            )));
        }

        let record = AnalysisResult {
            id: Uuid::new_v4(),
            session_id: session_id.to_string(),
            query: query.to_string(),
            filename: filename.to_string(),
            output: output.to_string(),
            created_at: chrono::Utc::now(),
        };
        let id = record.id;
        guard.push(record);
        Ok(id)
    }

    async fn get(&self, session_id: &str) -> AppResult<Option<AnalysisResult>> {
        let guard = self.inner.read().await;
        Ok(guard.iter().find(|r| r.session_id == session_id).cloned())
    }

    async fn list(&self, limit: Option<usize>) -> AppResult<Vec<AnalysisResult>> {
        let guard = self.inner.read().await;
        let mut results: Vec<AnalysisResult> = guard.iter().rev().cloned().collect();
        // stable sort: equal timestamps keep the most recent insert first
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
