use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::sleep;

use crate::{
    retry::{request_correlation_id, retry_after_hint},
    AiError, ChatRequest, ChatResponse, ChatUsage, LlmClient, RetryPolicy,
};

pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;

fn non_empty_env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[derive(Debug, Clone)]
/// Public struct `OpenAiConfig` used across Orin components.
pub struct OpenAiConfig {
    pub api_base: String,
    pub api_key: String,
    pub request_timeout_ms: u64,
    pub retry: RetryPolicy,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            api_key: String::new(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            retry: RetryPolicy::default(),
        }
    }
}

impl OpenAiConfig {
    /// Reads `OPENAI_API_KEY` plus optional `ORIN_OPENAI_API_BASE` override.
    pub fn from_env() -> Result<Self, AiError> {
        let api_key = non_empty_env_var("OPENAI_API_KEY").ok_or(AiError::MissingApiKey)?;
        let api_base = non_empty_env_var("ORIN_OPENAI_API_BASE")
            .unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string());
        Ok(Self {
            api_base,
            api_key,
            ..Self::default()
        })
    }
}

#[derive(Debug, Clone)]
/// Public struct `OpenAiClient` used across Orin components.
pub struct OpenAiClient {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, AiError> {
        if config.api_key.trim().is_empty() {
            return Err(AiError::MissingApiKey);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = format!("Bearer {}", config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer)
                .map_err(|e| AiError::InvalidResponse(format!("invalid API key header: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_millis(
                config.request_timeout_ms.max(1),
            ))
            .build()?;

        Ok(Self { client, config })
    }

    fn chat_completions_url(&self) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            return base.to_string();
        }

        format!("{base}/chat/completions")
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, AiError> {
        let body = json!({
            "model": request.model,
            "messages": request.messages,
        });
        let url = self.chat_completions_url();
        let policy = &self.config.retry;
        let started = std::time::Instant::now();
        let mut attempt = 0_usize;

        loop {
            let outcome = self
                .client
                .post(&url)
                .header("x-orin-request-id", request_correlation_id())
                .header("x-orin-retry-attempt", attempt.to_string())
                .json(&body)
                .send()
                .await;
            let spent_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if response.status().is_success() {
                        let raw = response.text().await?;
                        return parse_chat_response(&raw);
                    }

                    let hint = retry_after_hint(response.headers());
                    let raw = response.text().await?;
                    if RetryPolicy::retryable_status(status) {
                        if let Some(delay) = policy.delay_before_retry(attempt, spent_ms, hint) {
                            tracing::warn!(
                                status = status,
                                attempt = attempt,
                                delay_ms = delay.as_millis() as u64,
                                "retrying chat completion after upstream status"
                            );
                            sleep(delay).await;
                            attempt += 1;
                            continue;
                        }
                    }

                    return Err(AiError::HttpStatus { status, body: raw });
                }
                Err(error) => {
                    if RetryPolicy::retryable_transport_error(&error) {
                        if let Some(delay) = policy.delay_before_retry(attempt, spent_ms, None) {
                            tracing::warn!(
                                error = %error,
                                attempt = attempt,
                                delay_ms = delay.as_millis() as u64,
                                "retrying chat completion after transport error"
                            );
                            sleep(delay).await;
                            attempt += 1;
                            continue;
                        }
                    }
                    return Err(AiError::Http(error));
                }
            }
        }
    }
}

fn parse_chat_response(raw: &str) -> Result<ChatResponse, AiError> {
    let parsed: OpenAiChatResponse = serde_json::from_str(raw)?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AiError::InvalidResponse("response contained no choices".to_string()))?;

    let content = flatten_openai_content(&choice.message.content);
    let usage = parsed.usage.map(|usage| ChatUsage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens,
    });

    Ok(ChatResponse {
        content,
        finish_reason: choice.finish_reason,
        usage,
    })
}

/// Accepts both plain-string content and the part-array shape newer models return.
fn flatten_openai_content(content: &Option<Value>) -> String {
    match content {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| part.as_object())
            .filter_map(|part| {
                match part.get("type").and_then(Value::as_str).unwrap_or("text") {
                    "text" | "output_text" | "input_text" => part
                        .get("text")
                        .and_then(Value::as_str)
                        .filter(|text| !text.trim().is_empty())
                        .map(str::to_string),
                    _ => None,
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    content: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}
