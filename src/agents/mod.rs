//! Agent System
//!
//! The four analysts that review an uploaded financial document. Each one is
//! plain data: an [`AgentSpec`] describing who the agent is and which tools
//! it may use, and a [`TaskSpec`] describing what it must produce.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Uploaded document + query
//!      │
//!      ▼
//! ┌──────────────┐
//! │  Verifier    │  → Classifies and validates the document
//! └──────────────┘
//!      │
//!      ▼
//! ┌──────────────┐
//! │  Financial   │  → Reads the document, extracts findings
//! │  Analyst     │
//! └──────────────┘
//!      │
//!      ▼
//! ┌──────────────┐
//! │  Investment  │  → Recommendations from the metrics found
//! │  Advisor     │
//! └──────────────┘
//!      │
//!      ▼
//! ┌──────────────┐
//! │  Risk        │  → Risk ratings and mitigation
//! │  Assessor    │
//! └──────────────┘
//!      │
//!      ▼
//!  Final report
//! ```
//!
//! Steps run strictly in order through [`crew::Crew`]; every step sees the
//! answers of the steps before it.

pub mod crew;
pub mod financial_analyst;
pub mod investment_advisor;
pub mod risk_assessor;
pub mod verifier;

pub use crew::{Crew, CrewInputs, CrewOutput, CrewSettings, TaskOutput};

use crate::tools::ToolKind;

/// Who an agent is and how it may work.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpec {
    pub role: &'static str,
    /// May contain `{query}` / `{path}` placeholders.
    pub goal: &'static str,
    pub backstory: &'static str,
    pub tools: Vec<ToolKind>,
    pub allow_delegation: bool,
    /// Model calls allowed per step before giving up.
    pub max_iter: u32,
    /// Model calls per minute.
    pub max_rpm: u32,
}

/// A unit of work assigned to one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSpec {
    /// May contain `{query}` / `{path}` placeholders.
    pub description: &'static str,
    pub expected_output: &'static str,
    pub agent: AgentSpec,
}

/// The analysis pipeline in execution order.
pub fn financial_crew_steps() -> Vec<TaskSpec> {
    vec![
        verifier::task(),
        financial_analyst::task(),
        investment_advisor::task(),
        risk_assessor::task(),
    ]
}
