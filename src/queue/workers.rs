//! Analysis workers.
//!
//! Each worker slot pulls one job at a time, runs the crew against the
//! uploaded document, stores the answer and writes the markdown report. The
//! upload is removed once the job finishes, whatever the outcome.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::watch;
use tracing::{error, info, warn};

use super::broker::JobQueue;
use super::jobs::{AnalysisJob, TaskOutcome, TaskRecord};
use crate::agents::{Crew, CrewInputs};
use crate::config::WorkerConfig;
use crate::db::ResultStore;
use crate::storage::{write_error_report, write_report, LocalStorage, ReportMeta};
use crate::types::{AppError, AppResult};

pub const TIME_LIMIT_EXCEEDED: &str = "Task time limit exceeded";

pub struct Worker {
    queue: Arc<dyn JobQueue>,
    store: Arc<dyn ResultStore>,
    crew: Arc<Crew>,
    storage: LocalStorage,
    limits: WorkerConfig,
}

impl Worker {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        store: Arc<dyn ResultStore>,
        crew: Arc<Crew>,
        storage: LocalStorage,
        limits: WorkerConfig,
    ) -> Self {
        Self {
            queue,
            store,
            crew,
            storage,
            limits,
        }
    }

    /// Run `concurrency` slots until `shutdown` flips to true. In-flight jobs
    /// are allowed to finish.
    pub async fn run(self: Arc<Self>, concurrency: usize, shutdown: watch::Receiver<bool>) {
        let concurrency = concurrency.max(1);
        info!(concurrency, "Worker pool starting");

        let slots: Vec<_> = (0..concurrency)
            .map(|slot| {
                let worker = Arc::clone(&self);
                let shutdown = shutdown.clone();
                tokio::spawn(async move { worker.slot_loop(slot, shutdown).await })
            })
            .collect();

        for result in join_all(slots).await {
            if let Err(e) = result {
                error!(error = %e, "Worker slot panicked");
            }
        }

        info!("Worker pool stopped");
    }

    async fn slot_loop(&self, slot: usize, shutdown: watch::Receiver<bool>) {
        while !*shutdown.borrow() {
            if let Err(e) = self.run_once().await {
                error!(slot, error = %e, "Failed to fetch job");
                tokio::time::sleep(self.limits.poll_interval()).await;
            }
        }
        info!(slot, "Worker slot shutting down");
    }

    /// Wait one poll interval for a job and process it if one arrives.
    pub async fn run_once(&self) -> AppResult<Option<TaskOutcome>> {
        match self.queue.dequeue(self.limits.poll_interval()).await? {
            Some(job) => Ok(Some(self.process_job(job).await)),
            None => Ok(None),
        }
    }

    pub async fn process_job(&self, job: AnalysisJob) -> TaskOutcome {
        info!(
            task_id = %job.task_id,
            session_id = %job.session_id,
            filename = %job.filename,
            "Processing analysis job"
        );

        if let Err(e) = self
            .queue
            .update_state(&TaskRecord::progress(job.task_id, &job.session_id))
            .await
        {
            warn!(task_id = %job.task_id, error = %e, "Failed to report progress");
        }

        let outcome = match self.analyze_within_limits(&job).await {
            Ok(outcome) => outcome,
            Err(message) => self.fail(&job, message).await,
        };

        self.storage.remove_upload(Path::new(&job.file_path)).await;

        if let Err(e) = self
            .queue
            .update_state(&TaskRecord::from_outcome(job.task_id, &outcome))
            .await
        {
            error!(task_id = %job.task_id, error = %e, "Failed to record task outcome");
        }

        info!(
            task_id = %job.task_id,
            session_id = %job.session_id,
            state = %outcome.state(),
            "Analysis job finished"
        );
        outcome
    }

    async fn analyze_within_limits(&self, job: &AnalysisJob) -> Result<TaskOutcome, String> {
        let analysis = self.analyze(job);
        tokio::pin!(analysis);

        let soft = tokio::time::sleep(self.limits.soft_time_limit());
        tokio::pin!(soft);
        let hard = tokio::time::sleep(self.limits.hard_time_limit());
        tokio::pin!(hard);
        let mut soft_fired = false;

        loop {
            tokio::select! {
                result = &mut analysis => return result.map_err(|e| e.to_string()),
                _ = &mut soft, if !soft_fired => {
                    soft_fired = true;
                    warn!(
                        task_id = %job.task_id,
                        limit_secs = self.limits.soft_time_limit_secs,
                        "Analysis passed its soft time limit"
                    );
                }
                _ = &mut hard => {
                    error!(
                        task_id = %job.task_id,
                        limit_secs = self.limits.hard_time_limit_secs,
                        "Analysis hit its hard time limit"
                    );
                    return Err(TIME_LIMIT_EXCEEDED.to_string());
                }
            }
        }
    }

    async fn analyze(&self, job: &AnalysisJob) -> AppResult<TaskOutcome> {
        let inputs = CrewInputs {
            query: job.query.clone(),
            path: job.file_path.clone().into(),
        };
        let output = self.crew.kickoff(&inputs).await?;

        if output.raw.trim().is_empty() {
            return Err(AppError::LLMApi("Crew returned an empty analysis".to_string()));
        }

        let result_id = self
            .store
            .save(&job.session_id, &job.query, &output.raw, &job.filename)
            .await?;
        info!(session_id = %job.session_id, result_id = %result_id, "Analysis result stored");

        let meta = ReportMeta {
            session_id: &job.session_id,
            query: &job.query,
            filename: &job.filename,
            created_at: Utc::now(),
        };
        let markdown = write_report(self.storage.report_path(&job.session_id), &meta, &output.raw)
            .await?;

        Ok(TaskOutcome::success(
            &job.session_id,
            result_id,
            &output.raw,
            markdown.to_string_lossy().into_owned(),
        ))
    }

    async fn fail(&self, job: &AnalysisJob, message: String) -> TaskOutcome {
        error!(
            task_id = %job.task_id,
            session_id = %job.session_id,
            error = %message,
            "Analysis failed"
        );

        let error_file = match write_error_report(
            self.storage.error_report_path(&job.session_id),
            &job.session_id,
            &message,
        )
        .await
        {
            Ok(path) => Some(path.to_string_lossy().into_owned()),
            Err(e) => {
                error!(session_id = %job.session_id, error = %e, "Failed to write error report");
                None
            }
        };

        TaskOutcome::failure(&job.session_id, message, error_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryResultStore;
    use crate::llm::{LLMAdapter, MockAdapter, MockResponse};
    use crate::queue::{InMemoryJobQueue, TaskState};
    use crate::tools::Toolbox;
    use crate::types::{LLMProvider, LLMRequest, LLMResponse};
    use crate::agents::CrewSettings;
    use async_trait::async_trait;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        queue: Arc<InMemoryJobQueue>,
        store: Arc<InMemoryResultStore>,
        storage: LocalStorage,
        worker: Worker,
    }

    fn settings() -> CrewSettings {
        CrewSettings {
            model: "mock".to_string(),
            max_tokens: None,
            temperature: None,
        }
    }

    fn fixture(llm: Arc<dyn LLMAdapter>, limits: impl FnOnce(&mut WorkerConfig)) -> Fixture {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("data"), dir.path().join("outputs"));
        let queue = Arc::new(InMemoryJobQueue::new());
        let store = Arc::new(InMemoryResultStore::new());
        let crew = Arc::new(Crew::financial(llm, Toolbox::default(), settings()));

        let mut config = WorkerConfig {
            upload_dir: storage.upload_dir().to_path_buf(),
            outputs_dir: storage.outputs_dir().to_path_buf(),
            poll_interval_secs: 1,
            ..WorkerConfig::default()
        };
        limits(&mut config);

        let worker = Worker::new(queue.clone(), store.clone(), crew, storage.clone(), config);
        Fixture {
            _dir: dir,
            queue,
            store,
            storage,
            worker,
        }
    }

    async fn submit(fx: &Fixture, session_id: &str) -> AnalysisJob {
        let path = fx
            .storage
            .save_upload(session_id, b"Revenue 120 million. Debt 40. Market risk.")
            .await
            .unwrap();
        let job = AnalysisJob::new(
            session_id,
            "Summarize risk factors",
            path.to_string_lossy(),
            "report.pdf",
        );
        fx.queue.enqueue(&job).await.unwrap();
        job
    }

    #[tokio::test]
    async fn test_successful_job() {
        let answer = "x".repeat(400);
        let llm = Arc::new(MockAdapter::with_responses([
            MockResponse::text("verified"),
            MockResponse::text("analysis"),
            MockResponse::text("advice"),
            MockResponse::text(answer.clone()),
        ]));
        let fx = fixture(llm, |_| {});
        let job = submit(&fx, "s-ok").await;

        let outcome = fx.worker.run_once().await.unwrap().unwrap();
        let TaskOutcome::Success(success) = outcome else {
            panic!("expected success, got {:?}", outcome);
        };
        assert_eq!(success.status, "success");
        assert_eq!(success.session_id, "s-ok");
        assert_eq!(success.analysis, format!("{}...", "x".repeat(300)));

        // Upload is gone, report exists, record stored
        assert!(!Path::new(&job.file_path).exists());
        let report = std::fs::read_to_string(&success.markdown_file).unwrap();
        assert!(report.contains("**Filename:** report.pdf"));
        assert!(report.ends_with(&format!("{}\n", answer)));

        let stored = fx.store.get("s-ok").await.unwrap().unwrap();
        assert_eq!(stored.id, success.result_id);
        assert_eq!(stored.query, "Summarize risk factors");
        assert_eq!(stored.output, answer);

        let record = fx.queue.task_state(job.task_id).await.unwrap();
        assert_eq!(record.state, TaskState::Success);
        assert_eq!(record.session_id(), Some("s-ok"));
    }

    #[tokio::test]
    async fn test_model_failure_writes_error_report() {
        let llm = Arc::new(MockAdapter::with_responses([MockResponse::error("quota exceeded")]));
        let fx = fixture(llm, |_| {});
        let job = submit(&fx, "s-err").await;

        let outcome = fx.worker.run_once().await.unwrap().unwrap();
        let TaskOutcome::Failure(failure) = outcome else {
            panic!("expected failure, got {:?}", outcome);
        };
        assert_eq!(failure.status, "error");
        assert!(failure.error.contains("quota exceeded"));

        let error_file = failure.error_file.unwrap();
        assert!(error_file.ends_with("s-err_error.md"));
        let report = std::fs::read_to_string(error_file).unwrap();
        assert!(report.contains("quota exceeded"));

        assert!(!Path::new(&job.file_path).exists());
        assert!(fx.store.get("s-err").await.unwrap().is_none());

        let record = fx.queue.task_state(job.task_id).await.unwrap();
        assert_eq!(record.state, TaskState::Failure);
        assert!(record.error_message().unwrap().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_duplicate_session_fails_job() {
        let fx = fixture(Arc::new(MockAdapter::echo()), |_| {});
        fx.store.save("s-dup", "q", "earlier", "a.pdf").await.unwrap();
        let job = submit(&fx, "s-dup").await;

        let outcome = fx.worker.process_job(job).await;
        assert_eq!(outcome.state(), TaskState::Failure);
        assert_eq!(fx.store.len().await, 1);
    }

    struct StalledAdapter;

    #[async_trait]
    impl LLMAdapter for StalledAdapter {
        async fn create_chat_completion(&self, _request: &LLMRequest) -> AppResult<LLMResponse> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(AppError::LLMApi("unreachable".to_string()))
        }

        fn provider(&self) -> LLMProvider {
            LLMProvider::Mock
        }
    }

    #[tokio::test]
    async fn test_hard_time_limit() {
        let fx = fixture(Arc::new(StalledAdapter), |config| {
            config.hard_time_limit_secs = 1;
            config.soft_time_limit_secs = 0;
        });
        let job = submit(&fx, "s-slow").await;

        let outcome = fx.worker.process_job(job.clone()).await;
        let TaskOutcome::Failure(failure) = outcome else {
            panic!("expected failure, got {:?}", outcome);
        };
        assert_eq!(failure.error, TIME_LIMIT_EXCEEDED);
        assert!(failure.error_file.is_some());
        assert!(!Path::new(&job.file_path).exists());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let fx = fixture(Arc::new(MockAdapter::echo()), |_| {});
        let job = submit(&fx, "s-pool").await;
        let queue = fx.queue.clone();
        let store = fx.store.clone();
        let worker = Arc::new(fx.worker);

        let (tx, rx) = watch::channel(false);
        let pool = tokio::spawn(worker.run(2, rx));

        for _ in 0..50 {
            if queue.task_state(job.task_id).await.unwrap().state.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(
            queue.task_state(job.task_id).await.unwrap().state,
            TaskState::Success
        );
        assert!(store.get("s-pool").await.unwrap().is_some());

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), pool)
            .await
            .unwrap()
            .unwrap();
    }
}
