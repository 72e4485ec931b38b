//! Conversation orchestrator.
//!
//! Applies the fixed conversational system prompt, delegates to the
//! completion client, and refuses degenerate replies outright - a reply that
//! fails the reasonableness check must never be persisted as a valid
//! conversation turn.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::application::{CompletionClient, CompletionOutcome};
use crate::ports::AiError;

/// Policy constant, not configurable per call.
const SYSTEM_PROMPT: &str = "You are a helpful, concise, and professional assistant. \
Provide clear and direct responses. Keep responses under 500 tokens.";

/// Conversation failure modes.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error(transparent)]
    Provider(#[from] AiError),

    /// The provider reply was empty or absurdly long.
    #[error("model reply failed the reasonableness check")]
    UnreasonableReply,
}

/// Orchestrates one conversation turn per call.
pub struct ConversationService {
    client: Arc<CompletionClient>,
}

impl ConversationService {
    pub fn new(client: Arc<CompletionClient>) -> Self {
        Self { client }
    }

    /// Produce a conversational reply for `text`.
    ///
    /// An unreasonable reply is a hard failure: not retried, never passed
    /// through.
    pub async fn converse(&self, text: &str) -> Result<CompletionOutcome, ConversationError> {
        info!(preview = %preview(text), "processing conversation");

        let outcome = self.client.complete(text, Some(SYSTEM_PROMPT)).await?;

        if !self.client.is_reasonable(&outcome.response_text) {
            warn!(
                reply_chars = outcome.response_text.chars().count(),
                "discarding unreasonable model reply"
            );
            return Err(ConversationError::UnreasonableReply);
        }

        info!(
            elapsed_ms = outcome.processing_time_ms,
            "conversation processed"
        );
        Ok(outcome)
    }
}

/// First 50 characters, for log lines.
fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAiProvider;
    use crate::application::CompletionConfig;
    use std::time::Duration;

    fn service_over(provider: MockAiProvider) -> ConversationService {
        let config = CompletionConfig {
            model: "test-model".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            timeout: Duration::from_secs(5),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
        };
        ConversationService::new(Arc::new(CompletionClient::new(Arc::new(provider), config)))
    }

    #[tokio::test]
    async fn passes_the_fixed_system_prompt() {
        let provider = MockAiProvider::new().with_reply("Doing well, thanks.");
        let recorded = provider.clone();
        let service = service_over(provider);

        service.converse("How are you?").await.unwrap();

        let calls = recorded.calls();
        assert_eq!(calls[0].messages[0].content, SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn returns_the_completion_outcome() {
        let provider = MockAiProvider::new().with_reply_usage("Here to help.", 12, 8);
        let service = service_over(provider);

        let outcome = service.converse("hello").await.unwrap();
        assert_eq!(outcome.response_text, "Here to help.");
        assert_eq!(outcome.input_tokens, 12);
        assert_eq!(outcome.output_tokens, 8);
    }

    #[tokio::test]
    async fn empty_reply_is_a_hard_failure() {
        let provider = MockAiProvider::new().with_reply("");
        let service = service_over(provider);

        let err = service.converse("How are you?").await.unwrap_err();
        assert!(matches!(err, ConversationError::UnreasonableReply));
    }

    #[tokio::test]
    async fn oversized_reply_is_a_hard_failure() {
        let provider = MockAiProvider::new().with_reply("x".repeat(10_000));
        let service = service_over(provider);

        let err = service.converse("hello").await.unwrap_err();
        assert!(matches!(err, ConversationError::UnreasonableReply));
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let provider = MockAiProvider::new().with_error(AiError::AuthenticationFailed);
        let service = service_over(provider);

        let err = service.converse("hello").await.unwrap_err();
        assert!(matches!(
            err,
            ConversationError::Provider(AiError::AuthenticationFailed)
        ));
    }

    #[test]
    fn preview_truncates_to_fifty_chars() {
        let long = "a".repeat(80);
        assert_eq!(preview(&long).len(), 50);
        assert_eq!(preview("short"), "short");
    }
}
