//! Job payloads and task state records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Length of the analysis preview returned in a success payload.
pub const PREVIEW_CHARS: usize = 300;

/// One queued analysis, serialized as JSON on the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisJob {
    pub task_id: Uuid,
    pub session_id: String,
    pub query: String,
    pub file_path: String,
    /// Name the client uploaded the file under.
    pub filename: String,
    pub submitted_at: DateTime<Utc>,
}

impl AnalysisJob {
    pub fn new(
        session_id: impl Into<String>,
        query: impl Into<String>,
        file_path: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            session_id: session_id.into(),
            query: query.into(),
            file_path: file_path.into(),
            filename: filename.into(),
            submitted_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Pending,
    Progress,
    Success,
    Failure,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Success | TaskState::Failure)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Pending => write!(f, "PENDING"),
            TaskState::Progress => write!(f, "PROGRESS"),
            TaskState::Success => write!(f, "SUCCESS"),
            TaskState::Failure => write!(f, "FAILURE"),
        }
    }
}

/// Latest known state of a task plus its payload.
///
/// `info` holds `{status, session_id}` while in progress and the
/// success/failure payload once terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: Uuid,
    pub state: TaskState,
    pub info: Option<Value>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn pending(task_id: Uuid) -> Self {
        Self {
            task_id,
            state: TaskState::Pending,
            info: None,
            updated_at: Utc::now(),
        }
    }

    pub fn progress(task_id: Uuid, session_id: &str) -> Self {
        Self {
            task_id,
            state: TaskState::Progress,
            info: Some(json!({ "status": "processing", "session_id": session_id })),
            updated_at: Utc::now(),
        }
    }

    pub fn from_outcome(task_id: Uuid, outcome: &TaskOutcome) -> Self {
        let (state, info) = match outcome {
            TaskOutcome::Success(s) => (TaskState::Success, serde_json::to_value(s).ok()),
            TaskOutcome::Failure(f) => (TaskState::Failure, serde_json::to_value(f).ok()),
        };
        Self {
            task_id,
            state,
            info,
            updated_at: Utc::now(),
        }
    }

    fn info_str(&self, key: &str) -> Option<&str> {
        self.info.as_ref()?.get(key)?.as_str()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.info_str("session_id")
    }

    pub fn progress_message(&self) -> Option<&str> {
        self.info_str("status")
    }

    pub fn error_message(&self) -> Option<&str> {
        self.info_str("error")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSuccess {
    pub status: String,
    pub session_id: String,
    pub result_id: Uuid,
    pub analysis: String,
    pub markdown_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFailure {
    pub status: String,
    pub session_id: String,
    pub error: String,
    pub error_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Success(AnalysisSuccess),
    Failure(AnalysisFailure),
}

impl TaskOutcome {
    pub fn success(session_id: &str, result_id: Uuid, output: &str, markdown_file: String) -> Self {
        TaskOutcome::Success(AnalysisSuccess {
            status: "success".to_string(),
            session_id: session_id.to_string(),
            result_id,
            analysis: preview(output),
            markdown_file,
        })
    }

    pub fn failure(session_id: &str, error: impl Into<String>, error_file: Option<String>) -> Self {
        TaskOutcome::Failure(AnalysisFailure {
            status: "error".to_string(),
            session_id: session_id.to_string(),
            error: error.into(),
            error_file,
        })
    }

    pub fn state(&self) -> TaskState {
        match self {
            TaskOutcome::Success(_) => TaskState::Success,
            TaskOutcome::Failure(_) => TaskState::Failure,
        }
    }
}

/// First [`PREVIEW_CHARS`] characters, with `...` appended when cut.
pub fn preview(output: &str) -> String {
    match output.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &output[..idx]),
        None => output.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_wire_names() {
        assert_eq!(serde_json::to_string(&TaskState::Progress).unwrap(), "\"PROGRESS\"");
        assert_eq!(
            serde_json::from_str::<TaskState>("\"FAILURE\"").unwrap(),
            TaskState::Failure
        );
        assert!(!TaskState::Pending.is_terminal());
        assert!(TaskState::Success.is_terminal());
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short"), "short");

        let exact = "a".repeat(PREVIEW_CHARS);
        assert_eq!(preview(&exact), exact);

        let long = "é".repeat(PREVIEW_CHARS + 5);
        let cut = preview(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_record_accessors() {
        let id = Uuid::new_v4();
        let progress = TaskRecord::progress(id, "s1");
        assert_eq!(progress.session_id(), Some("s1"));
        assert_eq!(progress.progress_message(), Some("processing"));

        let failed = TaskRecord::from_outcome(id, &TaskOutcome::failure("s1", "boom", None));
        assert_eq!(failed.state, TaskState::Failure);
        assert_eq!(failed.error_message(), Some("boom"));
    }
}
