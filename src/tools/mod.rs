//! Tools available to the analysis agents.
//!
//! Each tool takes the run inputs and returns a plain-text observation that
//! is fed into the agent's prompt. Tool failures become observations too, so
//! a missing search key or unreadable file never aborts the pipeline.

pub mod document;
pub mod investment;
pub mod risk;

use std::path::PathBuf;

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::search::{format_results, SerpApiClient};

pub use document::read_financial_document;
pub use investment::investment_report;
pub use risk::risk_report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    WebSearch,
    DocumentReader,
    InvestmentAnalyzer,
    RiskAssessor,
}

impl ToolKind {
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::WebSearch => "Search the internet",
            ToolKind::DocumentReader => "Read Financial Document",
            ToolKind::InvestmentAnalyzer => "Investment Analysis Tool",
            ToolKind::RiskAssessor => "Risk Assessment Tool",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::WebSearch => "Searches Google for public information related to the query",
            ToolKind::DocumentReader => "Reads the uploaded financial document page by page",
            ToolKind::InvestmentAnalyzer => {
                "Extracts financial metrics and risk wording and suggests investment guidance"
            }
            ToolKind::RiskAssessor => "Scores market, credit, operational, liquidity and regulatory risk",
        }
    }
}

/// Per-run inputs shared by every tool call. The document text is read once
/// and reused by the analyzers.
pub struct ToolContext {
    pub query: String,
    pub path: PathBuf,
    document_text: OnceCell<String>,
}

impl ToolContext {
    pub fn new(query: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            query: query.into(),
            path: path.into(),
            document_text: OnceCell::new(),
        }
    }

    pub async fn document_text(&self) -> &str {
        self.document_text
            .get_or_init(|| async {
                let path = self.path.clone();
                match tokio::task::spawn_blocking(move || read_financial_document(&path)).await {
                    Ok(text) => text,
                    Err(e) => format!("Error: document reader task failed: {}", e),
                }
            })
            .await
    }
}

#[derive(Debug, Clone, Default)]
pub struct Toolbox {
    search: Option<SerpApiClient>,
}

impl Toolbox {
    pub fn new(search: Option<SerpApiClient>) -> Self {
        Self { search }
    }

    pub fn has_search(&self) -> bool {
        self.search.is_some()
    }

    /// Run one tool and return its observation.
    pub async fn run(&self, tool: ToolKind, ctx: &ToolContext) -> String {
        debug!(tool = tool.name(), "Running tool");
        match tool {
            ToolKind::WebSearch => self.web_search(&ctx.query).await,
            ToolKind::DocumentReader => ctx.document_text().await.to_string(),
            ToolKind::InvestmentAnalyzer => investment_report(ctx.document_text().await),
            ToolKind::RiskAssessor => risk_report(ctx.document_text().await),
        }
    }

    async fn web_search(&self, query: &str) -> String {
        let Some(client) = &self.search else {
            return "Web search unavailable: no search API key configured.".to_string();
        };

        match client.search(query).await {
            Ok(results) => format_results(query, &results),
            Err(e) => {
                warn!(error = %e, "Web search failed");
                format!("Web search unavailable: {}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_search_without_key_is_an_observation() {
        let toolbox = Toolbox::default();
        let ctx = ToolContext::new("ACME", "/nonexistent.pdf");
        let output = toolbox.run(ToolKind::WebSearch, &ctx).await;
        assert!(output.starts_with("Web search unavailable"));
    }

    #[tokio::test]
    async fn test_analyzers_share_document_text() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Net income 300 million. Debt rose. Loan default risk.").unwrap();

        let toolbox = Toolbox::default();
        let ctx = ToolContext::new("q", file.path());

        let document = toolbox.run(ToolKind::DocumentReader, &ctx).await;
        assert!(document.contains("Net income 300 million"));

        let investment = toolbox.run(ToolKind::InvestmentAnalyzer, &ctx).await;
        assert!(investment.contains("=== INVESTMENT ANALYSIS REPORT ==="));

        let risk = toolbox.run(ToolKind::RiskAssessor, &ctx).await;
        assert!(risk.contains("Credit Risk"));
    }

    #[tokio::test]
    async fn test_missing_document() {
        let ctx = ToolContext::new("q", "/nonexistent/file.pdf");
        let output = Toolbox::default().run(ToolKind::DocumentReader, &ctx).await;
        assert!(output.starts_with("Error: File not found"));
    }
}
