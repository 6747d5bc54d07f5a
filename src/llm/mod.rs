// LLM abstraction layer

pub mod provider;
pub mod gemini;
pub mod openai_compatible;
pub mod mock;

pub use provider::*;
pub use gemini::GeminiAdapter;
pub use openai_compatible::OpenAICompatibleAdapter;
pub use mock::{MockAdapter, MockResponse};
