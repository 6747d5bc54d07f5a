use std::sync::Arc;

use async_trait::async_trait;
use crate::config::LLMConfig;
use crate::types::{AppError, AppResult, LLMProvider, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;

    fn provider(&self) -> LLMProvider;
}

/// Build the adapter selected by `LLM_PROVIDER`.
pub fn adapter_from_config(config: &LLMConfig) -> AppResult<Arc<dyn LLMAdapter>> {
    let provider: LLMProvider = config.provider.parse()?;

    let adapter: Arc<dyn LLMAdapter> = match provider {
        LLMProvider::Gemini => {
            if !config.has_api_key() {
                return Err(AppError::InvalidRequest(
                    "GEMINI_API_KEY must be set for the gemini provider".to_string(),
                ));
            }
            let adapter = crate::llm::gemini::GeminiAdapter::new(&config.api_key);
            match &config.base_url {
                Some(url) => Arc::new(adapter.with_base_url(url)),
                None => Arc::new(adapter),
            }
        }
        LLMProvider::OpenAI => Arc::new(crate::llm::openai_compatible::OpenAICompatibleAdapter::new(
            &config.api_key,
            config.base_url.as_deref(),
        )),
        LLMProvider::Mock => Arc::new(crate::llm::mock::MockAdapter::echo()),
    };

    tracing::info!(provider = %provider, model = %config.model, "LLM adapter ready");
    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_requires_api_key() {
        let config = LLMConfig::default();
        assert!(matches!(
            adapter_from_config(&config),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_selects_configured_provider() {
        let config = LLMConfig {
            provider: "mock".to_string(),
            ..LLMConfig::default()
        };
        let adapter = adapter_from_config(&config).unwrap();
        assert_eq!(adapter.provider(), LLMProvider::Mock);

        let config = LLMConfig {
            provider: "gemini".to_string(),
            api_key: "test-key".to_string(),
            ..LLMConfig::default()
        };
        let adapter = adapter_from_config(&config).unwrap();
        assert_eq!(adapter.provider(), LLMProvider::Gemini);
    }
}
