//! SerpAPI Client
//!
//! Google web search used by the document verifier to cross-check company
//! names, filings and reporting standards mentioned in a document.

use serpapi_search_rust::serp_api_search::SerpApiSearch;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("SerpAPI key not configured")]
    NoApiKey,

    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse search results: {0}")]
    ParseError(String),

    #[error("No results found for query")]
    NoResults,
}

/// One organic Google result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebResult {
    pub title: String,
    pub snippet: String,
    pub link: String,
    /// Source domain
    pub source: Option<String>,
    pub date: Option<String>,
}

/// SerpAPI client for web search
#[derive(Debug, Clone)]
pub struct SerpApiClient {
    api_key: String,
    max_results: usize,
}

impl SerpApiClient {
    /// Configure client from config; `None` when no key is set.
    pub fn from_config(config: &crate::config::SearchConfig) -> Option<Self> {
        if config.serpapi_key.trim().is_empty() {
            return None;
        }

        Some(Self {
            api_key: config.serpapi_key.clone(),
            max_results: config.max_results.max(1),
        })
    }

    /// Search Google and return the organic results.
    pub async fn search(&self, query: &str) -> Result<Vec<WebResult>, SearchError> {
        if self.api_key.is_empty() {
            return Err(SearchError::NoApiKey);
        }

        info!(query = %query, "Searching Google via SerpAPI");

        let mut params = HashMap::<String, String>::new();
        params.insert("engine".to_string(), "google".to_string());
        params.insert("q".to_string(), query.to_string());
        params.insert("hl".to_string(), "en".to_string());
        params.insert("gl".to_string(), "us".to_string());
        params.insert("num".to_string(), self.max_results.to_string());

        let search = SerpApiSearch::google(params, self.api_key.clone());

        let results = search
            .json()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        debug!("Raw search response received");

        let parsed = parse_organic_results(&results, self.max_results)?;
        info!(count = parsed.len(), "Google search completed");
        Ok(parsed)
    }
}

/// Extract organic results from a SerpAPI response body.
pub fn parse_organic_results(
    body: &serde_json::Value,
    max_results: usize,
) -> Result<Vec<WebResult>, SearchError> {
    if let Some(error) = body.get("error").and_then(|v| v.as_str()) {
        return Err(SearchError::RequestFailed(error.to_string()));
    }

    let organic_results = body.get("organic_results").ok_or(SearchError::NoResults)?;

    let results_array = organic_results
        .as_array()
        .ok_or_else(|| SearchError::ParseError("Expected array of results".to_string()))?;

    if results_array.is_empty() {
        return Err(SearchError::NoResults);
    }

    let results = results_array
        .iter()
        .take(max_results)
        .filter_map(|result| {
            let link = result.get("link").and_then(|v| v.as_str())?.to_string();
            let title = result
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or("Untitled")
                .to_string();
            let snippet = result
                .get("snippet")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let source = result
                .get("source")
                .and_then(|v| v.as_str())
                .map(String::from)
                .or_else(|| domain_of(&link));
            let date = result.get("date").and_then(|v| v.as_str()).map(String::from);

            Some(WebResult {
                title,
                snippet,
                link,
                source,
                date,
            })
        })
        .collect();

    Ok(results)
}

/// Render results as a numbered list for a model prompt.
pub fn format_results(query: &str, results: &[WebResult]) -> String {
    let mut output = format!("Search results for: {}\n", query);
    for (i, result) in results.iter().enumerate() {
        output.push_str(&format!("\n{}. {}\n", i + 1, result.title));
        output.push_str(&format!("   Link: {}\n", result.link));
        if let Some(date) = &result.date {
            output.push_str(&format!("   Date: {}\n", date));
        }
        if !result.snippet.is_empty() {
            output.push_str(&format!("   {}\n", result.snippet));
        }
    }
    output
}

fn domain_of(url: &str) -> Option<String> {
    let without_scheme = url.split("://").nth(1).unwrap_or(url);
    let host = without_scheme.split('/').next()?;
    if host.is_empty() {
        None
    } else {
        Some(host.trim_start_matches("www.").to_string())
    }
}
