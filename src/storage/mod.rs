//! Local file storage
//!
//! Uploaded documents live under the upload directory only for the lifetime
//! of their analysis job; reports are written to the outputs directory and
//! kept.

pub mod reports;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::WorkerConfig;
use crate::types::AppResult;

pub use reports::{write_error_report, write_report, ReportMeta};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    upload_dir: PathBuf,
    outputs_dir: PathBuf,
}

impl LocalStorage {
    pub fn new(upload_dir: impl Into<PathBuf>, outputs_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            outputs_dir: outputs_dir.into(),
        }
    }

    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(config.upload_dir.clone(), config.outputs_dir.clone())
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn outputs_dir(&self) -> &Path {
        &self.outputs_dir
    }

    /// Session-scoped upload path. The extension is always `.pdf`.
    pub fn upload_path(&self, session_id: &str) -> PathBuf {
        self.upload_dir
            .join(format!("financial_document_{}.pdf", session_id))
    }

    pub fn report_path(&self, session_id: &str) -> PathBuf {
        self.outputs_dir.join(format!("{}.md", session_id))
    }

    pub fn error_report_path(&self, session_id: &str) -> PathBuf {
        self.outputs_dir.join(format!("{}_error.md", session_id))
    }

    /// Write an uploaded document, creating the upload directory if needed.
    pub async fn save_upload(&self, session_id: &str, data: &[u8]) -> AppResult<PathBuf> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let path = self.upload_path(session_id);
        tokio::fs::write(&path, data).await?;
        debug!(path = %path.display(), bytes = data.len(), "Upload saved");
        Ok(path)
    }

    /// Best effort; failures are logged and ignored.
    pub async fn remove_upload(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "Upload removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove upload"),
        }
    }
}
