//! LLM client: the single point of entry for all model calls in the intake API.
//!
//! No other module may call the Anthropic API directly. Resume analysis and
//! chat both go through `LanguageModel`, which `LlmClient` implements and tests
//! replace with a fake.
//!
//! Model: claude-sonnet-4-5, hardcoded so the model cannot drift per deployment.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::stream::{unfold, BoxStream, StreamExt};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[cfg(test)]
pub mod fake;
pub mod prompts;
pub mod stream;

use self::stream::{decode_event, SseDecoder, StreamSignal};

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Ordered text fragments of a streamed reply.
pub type TextStream = BoxStream<'static, Result<String, LlmError>>;

/// A text-in, text-out model. `AppState` carries it as `Arc<dyn LanguageModel>`.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Full reply text for one user prompt.
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError>;

    /// The same reply delivered as fragments, in arrival order.
    async fn complete_stream(&self, prompt: &str, system: &str) -> Result<TextStream, LlmError>;

    fn model_name(&self) -> &str;
}

/// Calls the model and deserializes the reply as JSON.
/// The prompt must instruct the model to return valid JSON.
pub async fn complete_json<T: DeserializeOwned>(
    llm: &dyn LanguageModel,
    prompt: &str,
    system: &str,
) -> Result<T, LlmError> {
    let text = llm.complete(prompt, system).await?;
    serde_json::from_str(extract_json(&text)).map_err(LlmError::Parse)
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Wraps the Anthropic Messages API with retry logic and streaming.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl LlmClient {
    pub fn new(api_key: String, api_url: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            api_key,
            api_url,
        })
    }

    /// Makes a raw call to the API, returning the full response object.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let response = self.send(prompt, system, false).await?;
        let llm_response: LlmResponse = response.json().await?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );

        Ok(llm_response)
    }

    /// Posts one request. Retries on 429 (rate limit) and 5xx errors with
    /// exponential backoff; any other non-success status fails immediately.
    async fn send(&self, prompt: &str, system: &str, stream: bool) -> Result<Response, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
            stream,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.api_url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            return Ok(response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let response = self.call(prompt, system).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }

    async fn complete_stream(&self, prompt: &str, system: &str) -> Result<TextStream, LlmError> {
        let response = self.send(prompt, system, true).await?;
        let bytes = Box::pin(response.bytes_stream());

        let fragments = unfold(
            (bytes, SseDecoder::new(), VecDeque::new(), false),
            |(mut bytes, mut decoder, mut pending, mut done)| async move {
                loop {
                    if let Some(item) = pending.pop_front() {
                        return Some((item, (bytes, decoder, pending, done)));
                    }
                    if done {
                        return None;
                    }
                    match bytes.next().await {
                        Some(Ok(chunk)) => {
                            for event in decoder.push(&chunk) {
                                match decode_event(&event) {
                                    Ok(StreamSignal::Text(text)) => pending.push_back(Ok(text)),
                                    Ok(StreamSignal::Stop) => done = true,
                                    Ok(StreamSignal::Ignore) => {}
                                    Err(e) => {
                                        pending.push_back(Err(e));
                                        done = true;
                                    }
                                }
                            }
                        }
                        Some(Err(e)) => {
                            pending.push_back(Err(LlmError::Http(e)));
                            done = true;
                        }
                        None => done = true,
                    }
                }
            },
        );

        Ok(fragments.boxed())
    }

    fn model_name(&self) -> &str {
        MODEL
    }
}

/// Reduces a model reply to its JSON payload: the body of a ```json fence if
/// there is one, otherwise the span from the first `{` to the last `}`.
pub fn extract_json(text: &str) -> &str {
    let stripped = strip_json_fences(text);
    if stripped.starts_with('{') || stripped.starts_with('[') {
        return stripped;
    }
    match (stripped.find('{'), stripped.rfind('}')) {
        (Some(start), Some(end)) if start < end => &stripped[start..=end],
        _ => stripped,
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output,
/// including fences preceded by prose.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(open) = text.find("```") else {
        return text;
    };
    let after = &text[open + 3..];
    let after = after.strip_prefix("json").unwrap_or(after);
    match after.find("```") {
        Some(close) => after[..close].trim(),
        None => after.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_after_prose() {
        let input = "Here you go:\n```json\n{\"a\": 1}\n```\nAnything else?";
        assert_eq!(strip_json_fences(input), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_json_from_chatty_reply() {
        let input = "Sure! The result is {\"name\": \"Jane\", \"nested\": {\"x\": 1}}, hope that helps.";
        assert_eq!(extract_json(input), "{\"name\": \"Jane\", \"nested\": {\"x\": 1}}");
    }

    #[test]
    fn test_extract_json_without_braces_is_passthrough() {
        assert_eq!(extract_json("no json here"), "no json here");
    }

    #[test]
    fn test_request_omits_stream_flag_when_false() {
        let body = AnthropicRequest {
            model: MODEL,
            max_tokens: 1,
            system: "s",
            messages: vec![],
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("stream").is_none());
    }
}
