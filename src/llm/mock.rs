//! Scripted model adapter.
//!
//! Replays queued responses in order and records every request it receives.
//! With an empty queue it falls back to echoing a short summary of the last
//! user message, which keeps offline `analyze` runs and tests deterministic.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::provider::LLMAdapter;
use crate::types::{AppError, AppResult, LLMProvider, LLMRequest, LLMResponse, TokenUsage};

#[derive(Debug, Clone)]
pub enum MockResponse {
    Text(String),
    Error(String),
}

impl MockResponse {
    pub fn text(content: impl Into<String>) -> Self {
        MockResponse::Text(content.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        MockResponse::Error(message.into())
    }
}

pub struct MockAdapter {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<LLMRequest>>,
    echo_when_empty: bool,
}

impl MockAdapter {
    /// Fails once the scripted responses run out.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            echo_when_empty: false,
        }
    }

    /// Echoes the prompt once the scripted responses run out.
    pub fn echo() -> Self {
        Self {
            echo_when_empty: true,
            ..Self::new()
        }
    }

    pub fn with_responses(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        let adapter = Self::new();
        adapter.add_responses(responses);
        adapter
    }

    pub fn add_responses(&self, responses: impl IntoIterator<Item = MockResponse>) {
        let mut queue = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        queue.extend(responses);
    }

    pub fn remaining_responses(&self) -> usize {
        self.responses.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<LLMRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn echo_response(request: &LLMRequest) -> String {
        let last = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let first_line = last.lines().next().unwrap_or_default();
        format!("Offline analysis ({} prompt chars): {}", last.len(), first_line)
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMAdapter for MockAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let next = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        let content = match next {
            Some(MockResponse::Text(content)) => content,
            Some(MockResponse::Error(message)) => return Err(AppError::LLMApi(message)),
            None if self.echo_when_empty => Self::echo_response(request),
            None => {
                return Err(AppError::LLMApi(
                    "MockAdapter: no more responses in queue".to_string(),
                ))
            }
        };

        Ok(LLMResponse {
            content,
            finish_reason: "stop".to_string(),
            usage: TokenUsage::default(),
        })
    }

    fn provider(&self) -> LLMProvider {
        LLMProvider::Mock
    }
}
