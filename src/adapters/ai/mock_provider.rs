//! Mock provider for tests.
//!
//! Scripted replies and errors are consumed in order; calls are recorded so
//! tests can assert on attempt counts and payload shape. Clones share the
//! same script and call history.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{AiError, AiProvider, CompletionRequest, ProviderResponse, TokenUsage};

#[derive(Debug, Clone)]
enum MockReply {
    Success {
        content: String,
        usage: TokenUsage,
    },
    Failure(AiError),
}

/// Configurable mock implementation of the provider port.
#[derive(Debug, Clone, Default)]
pub struct MockAiProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
    delay: Duration,
}

impl MockAiProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply with nominal token usage.
    pub fn with_reply(self, content: impl Into<String>) -> Self {
        self.with_reply_usage(content, 10, 20)
    }

    /// Queues a successful reply with explicit token counts.
    pub fn with_reply_usage(
        self,
        content: impl Into<String>,
        prompt_tokens: u32,
        completion_tokens: u32,
    ) -> Self {
        self.replies.lock().unwrap().push_back(MockReply::Success {
            content: content.into(),
            usage: TokenUsage::new(prompt_tokens, completion_tokens),
        });
        self
    }

    /// Queues a failure.
    pub fn with_error(self, error: AiError) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(MockReply::Failure(error));
        self
    }

    /// Simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// All recorded requests, in call order.
    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    fn next_reply(&self) -> MockReply {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockReply::Success {
                content: "Mock reply".to_string(),
                usage: TokenUsage::new(5, 10),
            })
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<ProviderResponse, AiError> {
        self.calls.lock().unwrap().push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_reply() {
            MockReply::Success { content, usage } => Ok(ProviderResponse { content, usage }),
            MockReply::Failure(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Message;

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest {
            model: "mock".to_string(),
            messages: vec![Message::user(text)],
            max_tokens: 100,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn replies_are_consumed_in_order() {
        let provider = MockAiProvider::new()
            .with_reply("first")
            .with_reply("second");

        let first = provider.complete(request("a")).await.unwrap();
        let second = provider.complete(request("b")).await.unwrap();
        assert_eq!(first.content, "first");
        assert_eq!(second.content, "second");
    }

    #[tokio::test]
    async fn errors_are_returned_from_the_queue() {
        let provider = MockAiProvider::new().with_error(AiError::rate_limited(5));
        let err = provider.complete(request("a")).await.unwrap_err();
        assert!(matches!(err, AiError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn exhausted_queue_yields_a_default_reply() {
        let provider = MockAiProvider::new();
        let reply = provider.complete(request("a")).await.unwrap();
        assert_eq!(reply.content, "Mock reply");
    }

    #[tokio::test]
    async fn calls_are_recorded_across_clones() {
        let provider = MockAiProvider::new();
        let clone = provider.clone();

        clone.complete(request("hello")).await.unwrap();

        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.calls()[0].messages[0].content, "hello");
    }
}
