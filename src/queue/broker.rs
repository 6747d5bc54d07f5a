//! Job broker.
//!
//! Jobs travel as JSON on a Redis list (`LPUSH` by the API, `BRPOP` by the
//! workers). Task state lives under `task-meta:{task_id}` and expires after
//! the configured TTL. An in-memory broker with the same semantics backs
//! tests and single-process runs.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::{Mutex, Notify, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::jobs::{AnalysisJob, TaskOutcome, TaskRecord};
use crate::config::RedisConfig;
use crate::types::{AppError, AppResult};

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Publish a job and mark its task `PENDING`.
    async fn enqueue(&self, job: &AnalysisJob) -> AppResult<()>;

    /// Wait up to `timeout` for the next job.
    async fn dequeue(&self, timeout: Duration) -> AppResult<Option<AnalysisJob>>;

    async fn update_state(&self, record: &TaskRecord) -> AppResult<()>;

    /// Unknown task ids read as `PENDING`.
    async fn task_state(&self, task_id: Uuid) -> AppResult<TaskRecord>;

    async fn ping(&self) -> AppResult<()>;
}

fn meta_key(task_id: Uuid) -> String {
    format!("task-meta:{}", task_id)
}

/// Whatever can be recovered from a job payload that failed to deserialize.
struct Salvaged {
    failure: TaskRecord,
    upload: Option<PathBuf>,
}

/// Needs at least a parseable `task_id`; without it there is no task to fail.
fn salvage_payload(payload: &str, reason: &str) -> Option<Salvaged> {
    let value: serde_json::Value = serde_json::from_str(payload).ok()?;
    let task_id = value.get("task_id")?.as_str()?.parse::<Uuid>().ok()?;
    let session_id = value
        .get("session_id")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let upload = value
        .get("file_path")
        .and_then(|v| v.as_str())
        .filter(|p| !p.is_empty())
        .map(PathBuf::from);

    let outcome = TaskOutcome::failure(session_id, reason, None);
    Some(Salvaged {
        failure: TaskRecord::from_outcome(task_id, &outcome),
        upload,
    })
}

#[derive(Clone)]
pub struct RedisJobQueue {
    con: ConnectionManager,
    // BRPOP holds its connection until it returns, so it gets its own.
    blocking: ConnectionManager,
    queue_name: String,
    result_ttl_secs: u64,
}

impl RedisJobQueue {
    pub async fn connect(config: &RedisConfig) -> AppResult<Self> {
        let client = redis::Client::open(config.url())?;
        let con = ConnectionManager::new(client.clone()).await?;
        let blocking = ConnectionManager::new(client).await?;

        info!(
            host = %config.host,
            port = config.port,
            queue = %config.queue_name,
            "Connected to Redis broker"
        );

        Ok(Self {
            con,
            blocking,
            queue_name: config.queue_name.clone(),
            result_ttl_secs: config.result_ttl_secs,
        })
    }

    /// Fail the task behind an unreadable payload, if it can be identified,
    /// and remove its upload.
    async fn discard_malformed(&self, payload: &str, error: serde_json::Error) -> AppError {
        let reason = format!("Malformed job payload: {}", error);
        warn!(payload = %payload, error = %error, "Discarding malformed job payload");

        if let Some(salvaged) = salvage_payload(payload, &reason) {
            if let Err(e) = self.update_state(&salvaged.failure).await {
                warn!(task_id = %salvaged.failure.task_id, error = %e, "Failed to record FAILURE");
            }
            if let Some(upload) = salvaged.upload {
                match tokio::fs::remove_file(&upload).await {
                    Ok(()) => debug!(path = %upload.display(), "Upload removed"),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => {
                        warn!(path = %upload.display(), error = %e, "Failed to remove upload")
                    }
                }
            }
        }

        AppError::Queue(reason)
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, job: &AnalysisJob) -> AppResult<()> {
        self.update_state(&TaskRecord::pending(job.task_id)).await?;

        let payload = serde_json::to_string(job)?;
        let mut con = self.con.clone();
        let _: () = con.lpush(&self.queue_name, payload).await?;

        debug!(task_id = %job.task_id, queue = %self.queue_name, "Job enqueued");
        Ok(())
    }

    async fn dequeue(&self, timeout: Duration) -> AppResult<Option<AnalysisJob>> {
        let mut con = self.blocking.clone();
        let popped: Option<(String, String)> =
            con.brpop(&self.queue_name, timeout.as_secs_f64()).await?;

        match popped {
            Some((_, payload)) => match serde_json::from_str::<AnalysisJob>(&payload) {
                Ok(job) => Ok(Some(job)),
                Err(e) => Err(self.discard_malformed(&payload, e).await),
            },
            None => Ok(None),
        }
    }

    async fn update_state(&self, record: &TaskRecord) -> AppResult<()> {
        let payload = serde_json::to_string(record)?;
        let mut con = self.con.clone();
        let _: () = con
            .set_ex(meta_key(record.task_id), payload, self.result_ttl_secs)
            .await?;
        Ok(())
    }

    async fn task_state(&self, task_id: Uuid) -> AppResult<TaskRecord> {
        let mut con = self.con.clone();
        let payload: Option<String> = con.get(meta_key(task_id)).await?;

        match payload {
            Some(payload) => Ok(serde_json::from_str(&payload)?),
            None => Ok(TaskRecord::pending(task_id)),
        }
    }

    async fn ping(&self) -> AppResult<()> {
        let mut con = self.con.clone();
        let pong: String = redis::cmd("PING").query_async(&mut con).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(AppError::Queue(format!("Unexpected PING reply: {}", pong)))
        }
    }
}

/// Process-local broker.
#[derive(Clone, Default)]
pub struct InMemoryJobQueue {
    jobs: Arc<Mutex<VecDeque<AnalysisJob>>>,
    notify: Arc<Notify>,
    states: Arc<RwLock<HashMap<Uuid, TaskRecord>>>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job: &AnalysisJob) -> AppResult<()> {
        self.update_state(&TaskRecord::pending(job.task_id)).await?;
        self.jobs.lock().await.push_back(job.clone());
        self.notify.notify_one();
        Ok(())
    }

    async fn dequeue(&self, timeout: Duration) -> AppResult<Option<AnalysisJob>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.notify.notified();
            if let Some(job) = self.jobs.lock().await.pop_front() {
                return Ok(Some(job));
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn update_state(&self, record: &TaskRecord) -> AppResult<()> {
        self.states.write().await.insert(record.task_id, record.clone());
        Ok(())
    }

    async fn task_state(&self, task_id: Uuid) -> AppResult<TaskRecord> {
        Ok(self
            .states
            .read()
            .await
            .get(&task_id)
            .cloned()
            .unwrap_or_else(|| TaskRecord::pending(task_id)))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
