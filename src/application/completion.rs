//! Completion client - the resilience wrapper around the model provider.
//!
//! Builds the ordered message payload, bounds each attempt with a timeout,
//! retries transient failures with exponential backoff, and reports latency
//! and token usage for the audit log. One client instance is shared by every
//! in-flight request; it holds no per-call state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use crate::config::AiConfig;
use crate::ports::{AiError, AiProvider, CompletionRequest, Message, ProviderResponse};

/// Upper bound (exclusive) on reply length accepted by `is_reasonable`.
const MAX_REASONABLE_CHARS: usize = 10_000;

/// Tuning for the completion client.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Model identifier sent with every request.
    pub model: String,
    /// Maximum tokens to generate per reply.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Bound on each provider attempt.
    pub timeout: Duration,
    /// Total attempts per completion, first try included.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per retry.
    pub initial_backoff: Duration,
    /// Ceiling on the backoff delay.
    pub max_backoff: Duration,
}

impl From<&AiConfig> for CompletionConfig {
    fn from(config: &AiConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.timeout(),
            max_attempts: config.max_attempts,
            initial_backoff: config.initial_backoff(),
            max_backoff: config.max_backoff(),
        }
    }
}

/// Result of one successful completion.
///
/// Token counts are reported by the provider verbatim; latency is measured
/// wall-clock across all attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOutcome {
    pub response_text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub processing_time_ms: f64,
    pub model_used: String,
}

/// Shared client for outbound completions.
pub struct CompletionClient {
    provider: Arc<dyn AiProvider>,
    config: CompletionConfig,
}

impl CompletionClient {
    pub fn new(provider: Arc<dyn AiProvider>, config: CompletionConfig) -> Self {
        Self { provider, config }
    }

    /// Run one completion: system message first when present, then the user
    /// message. Transient failures are retried internally; whatever error
    /// escapes here is final.
    pub async fn complete(
        &self,
        text: &str,
        system_prompt: Option<&str>,
    ) -> Result<CompletionOutcome, AiError> {
        let started = Instant::now();

        let mut messages = Vec::with_capacity(2);
        if let Some(prompt) = system_prompt {
            messages.push(Message::system(prompt));
        }
        messages.push(Message::user(text));

        let request = CompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self.complete_with_retry(&request).await?;
        let processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        info!(
            input_tokens = response.usage.prompt_tokens,
            output_tokens = response.usage.completion_tokens,
            elapsed_ms = processing_time_ms,
            "completion succeeded"
        );

        Ok(CompletionOutcome {
            response_text: response.content,
            input_tokens: response.usage.prompt_tokens,
            output_tokens: response.usage.completion_tokens,
            processing_time_ms,
            model_used: self.config.model.clone(),
        })
    }

    /// Advisory sanity check on a reply: non-empty and strictly shorter than
    /// the configured ceiling. Callers decide what a false result means.
    pub fn is_reasonable(&self, response: &str) -> bool {
        !response.is_empty() && response.chars().count() < MAX_REASONABLE_CHARS
    }

    async fn complete_with_retry(
        &self,
        request: &CompletionRequest,
    ) -> Result<ProviderResponse, AiError> {
        let mut backoff = self.config.initial_backoff;
        let mut attempt = 1;

        loop {
            match self.attempt_once(request).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt < self.config.max_attempts => {
                    warn!(
                        attempt,
                        max_attempts = self.config.max_attempts,
                        backoff_secs = backoff.as_secs_f64(),
                        error = %err,
                        "transient provider failure, backing off"
                    );
                    sleep(backoff).await;
                    backoff = (backoff * 2).min(self.config.max_backoff);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn attempt_once(&self, request: &CompletionRequest) -> Result<ProviderResponse, AiError> {
        match timeout(self.config.timeout, self.provider.complete(request.clone())).await {
            Ok(result) => result,
            Err(_) => Err(AiError::Timeout {
                timeout_secs: self.config.timeout.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAiProvider;
    use crate::ports::MessageRole;
    use proptest::prelude::*;

    fn test_config() -> CompletionConfig {
        CompletionConfig {
            model: "test-model".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            timeout: Duration::from_secs(5),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
        }
    }

    fn client_over(provider: MockAiProvider) -> CompletionClient {
        CompletionClient::new(Arc::new(provider), test_config())
    }

    #[tokio::test]
    async fn system_message_precedes_user_message() {
        let provider = MockAiProvider::new().with_reply("hello");
        let recorded = provider.clone();
        let client = client_over(provider);

        client
            .complete("How are you?", Some("Be helpful"))
            .await
            .unwrap();

        let calls = recorded.calls();
        assert_eq!(calls.len(), 1);
        let messages = &calls[0].messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[0].content, "Be helpful");
        assert_eq!(messages[1].role, MessageRole::User);
        assert_eq!(messages[1].content, "How are you?");
    }

    #[tokio::test]
    async fn omits_system_message_when_absent() {
        let provider = MockAiProvider::new().with_reply("hi");
        let recorded = provider.clone();
        let client = client_over(provider);

        client.complete("ping", None).await.unwrap();

        let calls = recorded.calls();
        assert_eq!(calls[0].messages.len(), 1);
        assert_eq!(calls[0].messages[0].role, MessageRole::User);
    }

    #[tokio::test]
    async fn reports_provider_token_counts_verbatim() {
        let provider = MockAiProvider::new().with_reply_usage("reply", 123, 45);
        let client = client_over(provider);

        let outcome = client.complete("text", None).await.unwrap();
        assert_eq!(outcome.input_tokens, 123);
        assert_eq!(outcome.output_tokens, 45);
        assert_eq!(outcome.model_used, "test-model");
        assert!(outcome.processing_time_ms >= 0.0);
    }

    #[tokio::test]
    async fn retries_rate_limit_then_succeeds_on_third_attempt() {
        let provider = MockAiProvider::new()
            .with_error(AiError::rate_limited(1))
            .with_error(AiError::rate_limited(1))
            .with_reply("finally");
        let recorded = provider.clone();
        let client = client_over(provider);

        let outcome = client.complete("text", None).await.unwrap();
        assert_eq!(outcome.response_text, "finally");
        assert_eq!(recorded.call_count(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let provider = MockAiProvider::new()
            .with_error(AiError::rate_limited(1))
            .with_error(AiError::rate_limited(1))
            .with_error(AiError::rate_limited(1))
            .with_error(AiError::rate_limited(1));
        let recorded = provider.clone();
        let client = client_over(provider);

        let err = client.complete("text", None).await.unwrap_err();
        assert!(matches!(err, AiError::RateLimited { .. }));
        assert_eq!(recorded.call_count(), 3);
    }

    #[tokio::test]
    async fn non_retryable_failure_propagates_immediately() {
        let provider = MockAiProvider::new()
            .with_error(AiError::AuthenticationFailed)
            .with_reply("never reached");
        let recorded = provider.clone();
        let client = client_over(provider);

        let err = client.complete("text", None).await.unwrap_err();
        assert!(matches!(err, AiError::AuthenticationFailed));
        assert_eq!(recorded.call_count(), 1);
    }

    #[tokio::test]
    async fn stalled_provider_surfaces_timeout() {
        let provider = MockAiProvider::new()
            .with_reply("too late")
            .with_delay(Duration::from_secs(600));
        let mut config = test_config();
        config.timeout = Duration::from_millis(20);
        config.max_attempts = 1;
        let client = CompletionClient::new(Arc::new(provider), config);

        let err = client.complete("text", None).await.unwrap_err();
        assert!(matches!(err, AiError::Timeout { .. }));
    }

    #[test]
    fn backoff_doubles_up_to_the_ceiling() {
        let config = test_config();
        let mut backoff = config.initial_backoff;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(backoff);
            backoff = (backoff * 2).min(config.max_backoff);
        }
        assert_eq!(
            seen,
            vec![
                Duration::from_millis(1),
                Duration::from_millis(2),
                Duration::from_millis(4),
                Duration::from_millis(4),
            ]
        );
    }

    #[test]
    fn reasonableness_boundaries() {
        let client = client_over(MockAiProvider::new());
        assert!(!client.is_reasonable(""));
        assert!(client.is_reasonable("x"));
        assert!(client.is_reasonable(&"x".repeat(9_999)));
        assert!(!client.is_reasonable(&"x".repeat(10_000)));
        assert!(!client.is_reasonable(&"x".repeat(10_001)));
    }

    proptest! {
        #[test]
        fn reasonableness_holds_across_the_accepted_range(len in 1usize..10_000) {
            let client = client_over(MockAiProvider::new());
            prop_assert!(client.is_reasonable(&"a".repeat(len)));
        }

        #[test]
        fn oversized_replies_are_unreasonable(extra in 0usize..100) {
            let client = client_over(MockAiProvider::new());
            prop_assert!(!client.is_reasonable(&"a".repeat(10_000 + extra)));
        }
    }
}
