//! Job queue: payloads, broker backends and the worker pool.

pub mod broker;
pub mod jobs;
pub mod workers;

pub use broker::{InMemoryJobQueue, JobQueue, RedisJobQueue};
pub use jobs::{AnalysisFailure, AnalysisJob, AnalysisSuccess, TaskOutcome, TaskRecord, TaskState};
pub use workers::Worker;
