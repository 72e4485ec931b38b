//! End-to-end service flows over a scripted provider.
//!
//! Exercises the resilience wrapper and both orchestrators together, the way
//! the HTTP handlers drive them.

use std::sync::Arc;
use std::time::Duration;

use replyline::adapters::ai::MockAiProvider;
use replyline::application::{
    CompletionClient, CompletionConfig, ConversationError, ConversationService,
    SmsDecisionService,
};
use replyline::domain::SmsDecisionKind;
use replyline::ports::AiError;

fn fast_config() -> CompletionConfig {
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

fn client_over(provider: &MockAiProvider) -> Arc<CompletionClient> {
    Arc::new(CompletionClient::new(
        Arc::new(provider.clone()),
        fast_config(),
    ))
}

#[tokio::test]
async fn conversation_survives_two_rate_limits() {
    let provider = MockAiProvider::new()
        .with_error(AiError::rate_limited(1))
        .with_error(AiError::rate_limited(1))
        .with_reply("Recovered and replying.");
    let service = ConversationService::new(client_over(&provider));

    let outcome = service.converse("still there?").await.unwrap();
    assert_eq!(outcome.response_text, "Recovered and replying.");
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn persistent_rate_limiting_fails_after_three_attempts() {
    let provider = MockAiProvider::new()
        .with_error(AiError::rate_limited(1))
        .with_error(AiError::rate_limited(1))
        .with_error(AiError::rate_limited(1))
        .with_error(AiError::rate_limited(1));
    let service = ConversationService::new(client_over(&provider));

    let err = service.converse("anyone home?").await.unwrap_err();
    assert!(matches!(
        err,
        ConversationError::Provider(AiError::RateLimited { .. })
    ));
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn a_stalled_provider_cannot_hang_a_conversation() {
    let provider = MockAiProvider::new()
        .with_reply("too late")
        .with_delay(Duration::from_secs(600));
    let mut config = fast_config();
    config.timeout = Duration::from_millis(20);
    config.max_attempts = 1;
    let client = Arc::new(CompletionClient::new(Arc::new(provider), config));
    let service = ConversationService::new(client);

    let err = tokio::time::timeout(Duration::from_secs(2), service.converse("hello"))
        .await
        .expect("converse must resolve well before the outer bound")
        .unwrap_err();
    assert!(matches!(
        err,
        ConversationError::Provider(AiError::Timeout { .. })
    ));
}

#[tokio::test]
async fn triage_retries_share_the_client_policy() {
    let provider = MockAiProvider::new()
        .with_error(AiError::unavailable("503"))
        .with_reply(r#"{"decision":"yes","reply":"On it"}"#);
    let service = SmsDecisionService::new(client_over(&provider));

    let decision = service.decide("Can you pick this up?").await.unwrap();
    assert_eq!(decision.decision, SmsDecisionKind::Yes);
    assert_eq!(decision.reply_text, "On it");
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn triage_degrades_instead_of_failing_on_garbage_output() {
    let provider = MockAiProvider::new().with_reply("```json maybe?```");
    let service = SmsDecisionService::new(client_over(&provider));

    let decision = service.decide("Dinner tonight?").await.unwrap();
    assert_eq!(decision.decision, SmsDecisionKind::No);
    assert_eq!(decision.reply_text, "Unable to process request");
}

#[tokio::test]
async fn both_orchestrators_can_share_one_client() {
    let provider = MockAiProvider::new()
        .with_reply("Happy to chat.")
        .with_reply(r#"{"decision":"no","reply":"Maybe later"}"#);
    let client = client_over(&provider);
    let conversation = ConversationService::new(client.clone());
    let sms = SmsDecisionService::new(client);

    let outcome = conversation.converse("hi").await.unwrap();
    assert_eq!(outcome.response_text, "Happy to chat.");

    let decision = sms.decide("Join us?").await.unwrap();
    assert_eq!(decision.decision, SmsDecisionKind::No);
    assert_eq!(decision.reply_text, "Maybe later");

    assert_eq!(provider.call_count(), 2);
}
