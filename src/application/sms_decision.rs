//! SMS triage orchestrator.
//!
//! Asks the model for a two-field JSON payload and interprets it as a yes/no
//! decision. This is the one place where provider output becomes control
//! data, so the payload is treated as untrusted text: interpretation can
//! never fail, only degrade to a conservative "no".

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::application::CompletionClient;
use crate::domain::SmsDecisionKind;
use crate::ports::AiError;

const TRIAGE_SYSTEM_PROMPT: &str =
    "You are an SMS assistant that makes quick yes/no decisions and suggests replies.";

/// Reply text used when the payload cannot be interpreted at all.
const FALLBACK_REPLY: &str = "Unable to process request";

/// Outcome of one triage call.
#[derive(Debug, Clone, PartialEq)]
pub struct SmsDecision {
    pub decision: SmsDecisionKind,
    pub reply_text: String,
    pub processing_time_ms: f64,
}

impl SmsDecision {
    fn fallback(processing_time_ms: f64) -> Self {
        Self {
            decision: SmsDecisionKind::No,
            reply_text: FALLBACK_REPLY.to_string(),
            processing_time_ms,
        }
    }
}

/// What the model is asked to produce; every field may be missing.
#[derive(Debug, Deserialize)]
struct RawDecision {
    decision: Option<String>,
    reply: Option<String>,
}

/// Orchestrates one SMS triage per call.
pub struct SmsDecisionService {
    client: Arc<CompletionClient>,
}

impl SmsDecisionService {
    pub fn new(client: Arc<CompletionClient>) -> Self {
        Self { client }
    }

    /// Decide whether `text` deserves a positive response.
    ///
    /// Transport failures from the completion client propagate; the payload
    /// itself is interpreted infallibly.
    pub async fn decide(&self, text: &str) -> Result<SmsDecision, AiError> {
        info!(preview = %preview(text), "processing sms decision");

        let outcome = self
            .client
            .complete(&triage_prompt(text), Some(TRIAGE_SYSTEM_PROMPT))
            .await?;

        let decision = interpret(&outcome.response_text, outcome.processing_time_ms);
        info!(decision = decision.decision.as_str(), "sms decision made");
        Ok(decision)
    }
}

fn triage_prompt(text: &str) -> String {
    format!(
        "You must respond with a JSON object containing:\n\
         1. \"decision\": \"yes\" or \"no\"\n\
         2. \"reply\": a brief reply message (max 50 words)\n\
         \n\
         SMS text: {text}\n\
         \n\
         For this SMS, should the user respond positively? Respond with valid JSON only."
    )
}

/// Interpretation policy for the model payload:
/// - not JSON, or no `decision` field: "no" with the fallback reply
/// - `decision` outside yes/no (case-insensitive): normalized to "no",
///   supplied reply kept
/// - missing `reply`: empty string
fn interpret(raw: &str, processing_time_ms: f64) -> SmsDecision {
    let parsed: RawDecision = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "triage reply was not valid JSON, falling back to no");
            return SmsDecision::fallback(processing_time_ms);
        }
    };

    let Some(label) = parsed.decision else {
        warn!("triage reply omitted the decision field, falling back to no");
        return SmsDecision::fallback(processing_time_ms);
    };

    let decision = match label.to_lowercase().as_str() {
        "yes" => SmsDecisionKind::Yes,
        "no" => SmsDecisionKind::No,
        other => {
            warn!(decision = other, "out-of-domain decision, normalizing to no");
            SmsDecisionKind::No
        }
    };

    SmsDecision {
        decision,
        reply_text: parsed.reply.unwrap_or_default(),
        processing_time_ms,
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

    fn service_over(provider: MockAiProvider) -> SmsDecisionService {
        let config = CompletionConfig {
            model: "test-model".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            timeout: Duration::from_secs(5),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
        };
        SmsDecisionService::new(Arc::new(CompletionClient::new(Arc::new(provider), config)))
    }

    #[tokio::test]
    async fn well_formed_yes_payload() {
        let provider = MockAiProvider::new()
            .with_reply(r#"{"decision":"yes","reply":"Sure, I can help"}"#);
        let service = service_over(provider);

        let decision = service
            .decide("Can you help me with this project?")
            .await
            .unwrap();
        assert_eq!(decision.decision, SmsDecisionKind::Yes);
        assert_eq!(decision.reply_text, "Sure, I can help");
    }

    #[tokio::test]
    async fn non_json_reply_falls_back() {
        let provider = MockAiProvider::new().with_reply("This is not valid JSON");
        let service = service_over(provider);

        let decision = service.decide("Some text").await.unwrap();
        assert_eq!(decision.decision, SmsDecisionKind::No);
        assert_eq!(decision.reply_text, "Unable to process request");
    }

    #[tokio::test]
    async fn missing_decision_field_falls_back() {
        let provider = MockAiProvider::new().with_reply(r#"{"reply":"hello there"}"#);
        let service = service_over(provider);

        let decision = service.decide("Some text").await.unwrap();
        assert_eq!(decision.decision, SmsDecisionKind::No);
        assert_eq!(decision.reply_text, "Unable to process request");
    }

    #[tokio::test]
    async fn out_of_domain_decision_keeps_supplied_reply() {
        let provider =
            MockAiProvider::new().with_reply(r#"{"decision":"maybe","reply":"hard to say"}"#);
        let service = service_over(provider);

        let decision = service.decide("Some text").await.unwrap();
        assert_eq!(decision.decision, SmsDecisionKind::No);
        assert_eq!(decision.reply_text, "hard to say");
    }

    #[tokio::test]
    async fn decision_matching_is_case_insensitive() {
        let provider = MockAiProvider::new().with_reply(r#"{"decision":"YES","reply":"ok"}"#);
        let service = service_over(provider);

        let decision = service.decide("Some text").await.unwrap();
        assert_eq!(decision.decision, SmsDecisionKind::Yes);
    }

    #[tokio::test]
    async fn missing_reply_defaults_to_empty_string() {
        let provider = MockAiProvider::new().with_reply(r#"{"decision":"no"}"#);
        let service = service_over(provider);

        let decision = service.decide("Some text").await.unwrap();
        assert_eq!(decision.decision, SmsDecisionKind::No);
        assert_eq!(decision.reply_text, "");
    }

    #[tokio::test]
    async fn non_object_json_falls_back() {
        let provider = MockAiProvider::new().with_reply(r#"["yes","no"]"#);
        let service = service_over(provider);

        let decision = service.decide("Some text").await.unwrap();
        assert_eq!(decision.decision, SmsDecisionKind::No);
        assert_eq!(decision.reply_text, "Unable to process request");
    }

    #[tokio::test]
    async fn transport_failure_still_propagates() {
        let provider = MockAiProvider::new().with_error(AiError::AuthenticationFailed);
        let service = service_over(provider);

        let err = service.decide("Some text").await.unwrap_err();
        assert!(matches!(err, AiError::AuthenticationFailed));
    }

    #[test]
    fn prompt_embeds_the_sms_text_and_contract() {
        let prompt = triage_prompt("Lunch tomorrow?");
        assert!(prompt.contains("SMS text: Lunch tomorrow?"));
        assert!(prompt.contains("\"decision\": \"yes\" or \"no\""));
        assert!(prompt.contains("valid JSON only"));
    }
}
