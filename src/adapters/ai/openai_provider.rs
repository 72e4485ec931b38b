//! OpenAI-compatible chat-completions transport.
//!
//! Performs exactly one HTTP attempt per call and translates transport and
//! status failures into the `AiError` taxonomy; timeout bounding and retries
//! live in the completion client.

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AiConfig;
use crate::ports::{
    AiError, AiProvider, CompletionRequest, MessageRole, ProviderResponse, TokenUsage,
};

/// Fallback retry hint when the provider rate-limits without a Retry-After.
const DEFAULT_RETRY_AFTER_SECS: u32 = 30;

/// Transport configuration for the OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    api_key: Secret<String>,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Socket-level request timeout; kept above the client's own bound so
    /// the client's timeout is the one that fires.
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

impl From<&AiConfig> for OpenAiConfig {
    fn from(config: &AiConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            // Leave the bounding to the completion client; give the socket
            // three times that much headroom.
            timeout: config.timeout() * 3,
        }
    }
}

/// OpenAI-compatible provider implementation.
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn to_wire_request(&self, request: &CompletionRequest) -> WireRequest {
        WireRequest {
            model: request.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|msg| WireMessage {
                    role: match msg.role {
                        MessageRole::System => "system",
                        MessageRole::User => "user",
                        MessageRole::Assistant => "assistant",
                    }
                    .to_string(),
                    content: msg.content.clone(),
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, AiError> {
        self.client
            .post(self.completions_url())
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.api_key()),
            )
            .json(&self.to_wire_request(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout {
                        timeout_secs: self.config.timeout.as_secs(),
                    }
                } else if e.is_connect() {
                    AiError::network(format!("Connection failed: {}", e))
                } else {
                    AiError::network(e.to_string())
                }
            })
    }

    async fn handle_response_status(&self, response: Response) -> Result<Response, AiError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let retry_after = parse_retry_after(&response);
        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => Err(AiError::AuthenticationFailed),
            429 => Err(AiError::rate_limited(retry_after)),
            400 => Err(AiError::InvalidRequest(error_body)),
            500..=599 => Err(AiError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(AiError::Unexpected(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    async fn parse_response(&self, response: Response) -> Result<ProviderResponse, AiError> {
        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| AiError::parse(format!("Failed to parse response: {}", e)))?;

        let choice = wire
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AiError::parse("No choices in response"))?;

        let usage = wire
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(ProviderResponse {
            content: choice.message.content,
            usage,
        })
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<ProviderResponse, AiError> {
        let response = self.send_request(&request).await?;
        let response = self.handle_response_status(response).await?;
        self.parse_response(response).await
    }
}

/// Reads the standard Retry-After header; seconds form only.
fn parse_retry_after(response: &Response) -> u32 {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

// ----- Wire types -----

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Message;

    #[test]
    fn config_builder_works() {
        let config = OpenAiConfig::new("test-key")
            .with_base_url("https://custom.api.com/v1")
            .with_timeout(Duration::from_secs(30));

        assert_eq!(config.base_url, "https://custom.api.com/v1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn completions_url_appends_path() {
        let provider = OpenAiProvider::new(
            OpenAiConfig::new("k").with_base_url("https://example.test/v1"),
        );
        assert_eq!(
            provider.completions_url(),
            "https://example.test/v1/chat/completions"
        );
    }

    #[test]
    fn wire_request_preserves_message_order_and_roles() {
        let provider = OpenAiProvider::new(OpenAiConfig::new("k"));
        let request = CompletionRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![Message::system("guide"), Message::user("ask")],
            max_tokens: 500,
            temperature: 0.7,
        };

        let wire = provider.to_wire_request(&request);
        assert_eq!(wire.model, "gpt-3.5-turbo");
        assert_eq!(wire.messages.len(), 2);
        assert_eq!(wire.messages[0].role, "system");
        assert_eq!(wire.messages[0].content, "guide");
        assert_eq!(wire.messages[1].role, "user");
        assert_eq!(wire.max_tokens, 500);
    }

    #[test]
    fn wire_response_deserializes() {
        let json = r#"{
            "choices": [{"message": {"role": "assistant", "content": "Hello!"}}],
            "usage": {"prompt_tokens": 9, "completion_tokens": 3}
        }"#;
        let wire: WireResponse = serde_json::from_str(json).unwrap();
        assert_eq!(wire.choices[0].message.content, "Hello!");
        assert_eq!(wire.usage.unwrap().prompt_tokens, 9);
    }

    #[test]
    fn wire_response_tolerates_missing_usage() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": "Hi"}}]}"#;
        let wire: WireResponse = serde_json::from_str(json).unwrap();
        assert!(wire.usage.is_none());
    }
}
