//! Search Module
//!
//! Web search for the document verifier, backed by SerpAPI's Google engine.

pub mod serpapi;

pub use serpapi::{format_results, parse_organic_results, SearchError, SerpApiClient, WebResult};
