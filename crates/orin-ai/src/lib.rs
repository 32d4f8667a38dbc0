//! OpenAI-compatible chat completion client with bounded retries.
mod openai;
mod retry;
mod types;

pub use openai::{OpenAiClient, OpenAiConfig, DEFAULT_OPENAI_API_BASE};
pub use retry::RetryPolicy;
pub use types::{
    AiError, ChatMessage, ChatRequest, ChatResponse, ChatUsage, LlmClient, MessageRole,
};
