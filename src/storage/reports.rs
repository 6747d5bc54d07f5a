//! Markdown reports written for every finished job.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::types::AppResult;

/// Who and what a report is about.
#[derive(Debug, Clone)]
pub struct ReportMeta<'a> {
    pub session_id: &'a str,
    pub query: &'a str,
    pub filename: &'a str,
    pub created_at: DateTime<Utc>,
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn render_report(meta: &ReportMeta<'_>, output: &str) -> String {
    format!(
        "# Financial Analysis Report\n\n\
         **Session ID:** {}\n\n\
         **Query:** {}\n\n\
         **Filename:** {}\n\n\
         **Created At:** {}\n\n\
         ---\n\n\
         {}\n",
        meta.session_id,
        meta.query,
        meta.filename,
        timestamp(&meta.created_at),
        output
    )
}

pub fn render_error_report(session_id: &str, error: &str, created_at: &DateTime<Utc>) -> String {
    format!(
        "# Error Report\n\n\
         **Session ID:** {}\n\n\
         **Error:** {}\n\n\
         **Created At:** {}\n",
        session_id,
        error,
        timestamp(created_at)
    )
}

async fn write(path: &Path, content: &str) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;
    Ok(())
}

pub async fn write_report(path: PathBuf, meta: &ReportMeta<'_>, output: &str) -> AppResult<PathBuf> {
    write(&path, &render_report(meta, output)).await?;
    Ok(path)
}

pub async fn write_error_report(path: PathBuf, session_id: &str, error: &str) -> AppResult<PathBuf> {
    write(&path, &render_error_report(session_id, error, &Utc::now())).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_render_report_layout() {
        let created_at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap();
        let meta = ReportMeta {
            session_id: "s1",
            query: "Summarize risk factors",
            filename: "report.pdf",
            created_at,
        };

        let report = render_report(&meta, "All good.");
        assert_eq!(
            report,
            "# Financial Analysis Report\n\n\
             **Session ID:** s1\n\n\
             **Query:** Summarize risk factors\n\n\
             **Filename:** report.pdf\n\n\
             **Created At:** 2025-03-01T12:30:00.000000Z\n\n\
             ---\n\n\
             All good.\n"
        );
    }

    #[tokio::test]
    async fn test_write_error_report_creates_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("outputs/s1_error.md");

        let written = write_error_report(path.clone(), "s1", "boom").await.unwrap();
        assert_eq!(written, path);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Error Report\n\n**Session ID:** s1\n\n**Error:** boom\n"));
        assert!(content.contains("**Created At:** "));
        assert!(content.trim_end().ends_with('Z'));
    }
}
