//! Model provider port.
//!
//! Abstracts the outbound chat-completion call so the orchestration layer can
//! generate replies without coupling to a specific provider or transport.
//! Implementations perform exactly one attempt per call; timeout bounding and
//! retry policy belong to the completion client, not to the adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for chat-completion providers.
///
/// Implementations are safe for concurrent use by many in-flight requests;
/// callers never mutate shared provider state.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Perform a single completion attempt.
    async fn complete(&self, request: CompletionRequest) -> Result<ProviderResponse, AiError>;
}

/// One outbound completion request.
///
/// Constructed per call and owned by it; never persisted.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model identifier to run.
    pub model: String,
    /// Ordered message list; a system message, when present, comes first to
    /// establish instruction priority.
    pub messages: Vec<Message>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// A message in the outbound payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// What comes back from a successful provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    /// Generated text.
    pub content: String,
    /// Token usage exactly as reported by the provider.
    pub usage: TokenUsage,
}

/// Token usage as reported by the provider; never recomputed locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }
}

/// Provider failure taxonomy.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AiError {
    /// No response within the configured bound.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// Rate limited by the provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed, as hinted by the provider.
        retry_after_secs: u32,
    },

    /// Provider-side failure (5xx).
    #[error("provider unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Network error during the request.
    #[error("network error: {0}")]
    Network(String),

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The provider rejected the request as malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Failed to parse the provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Anything the taxonomy does not cover.
    #[error("unexpected provider failure: {0}")]
    Unexpected(String),
}

impl AiError {
    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Whether the retry loop should try again after this failure.
    ///
    /// Timeouts count as transient: the upstream either never saw the
    /// request or was momentarily slow, and a fresh attempt is cheap.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AiError::Timeout { .. }
                | AiError::RateLimited { .. }
                | AiError::Unavailable { .. }
                | AiError::Network(_)
        )
    }
}
