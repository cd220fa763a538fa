//! Mock provider implementation for local runs and tests.

use super::{FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider};
use crate::services::prompt::TOPIC_LIST_MARKER;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// What the mock does on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehaviour {
    /// Answer with a well-formed post.
    Succeed,
    /// Answer 429-style.
    RateLimited,
    /// Answer 5xx-style.
    Unavailable,
    /// Reject the request outright.
    Reject,
    /// Answer with no text.
    Empty,
    /// Sleep before answering, to exercise timeouts.
    Stall(Duration),
}

/// Mock text provider with a call counter.
pub struct MockTextProvider {
    model: String,
    behaviour: MockBehaviour,
    call_count: AtomicU64,
}

impl MockTextProvider {
    pub fn new(model: impl Into<String>, behaviour: MockBehaviour) -> Self {
        Self {
            model: model.into(),
            behaviour,
            call_count: AtomicU64::new(0),
        }
    }

    pub fn succeeding(model: impl Into<String>) -> Self {
        Self::new(model, MockBehaviour::Succeed)
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }

    fn canned_text(prompt: &str) -> String {
        if prompt.contains(TOPIC_LIST_MARKER) {
            return (1..=10)
                .map(|i| format!("{}. Mock topic idea {}", i, i))
                .collect::<Vec<_>>()
                .join("\n");
        }

        let topic = prompt
            .lines()
            .find_map(|line| line.trim().strip_prefix("Topic:"))
            .map(str::trim)
            .unwrap_or("your topic");

        format!(
            "TITLE: Mock insights on {topic}\n\n\
             CONTENT: This is a mock post about {topic}.\n\n\
             It exists so the pipeline can run without a model.\n\n\
             HASHTAGS: #Mock #LinkedIn\n\n\
             CALL_TO_ACTION: Share your thoughts on {topic} below."
        )
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let text = match &self.behaviour {
            MockBehaviour::Succeed => Some(Self::canned_text(prompt)),
            MockBehaviour::RateLimited => {
                return Err(ProviderError::RateLimited(
                    "Mock quota exhausted".to_string(),
                ))
            }
            MockBehaviour::Unavailable => {
                return Err(ProviderError::Unavailable("Mock provider down".to_string()))
            }
            MockBehaviour::Reject => {
                return Err(ProviderError::InvalidRequest(
                    "Mock provider rejected the prompt".to_string(),
                ))
            }
            MockBehaviour::Empty => None,
            MockBehaviour::Stall(delay) => {
                tokio::time::sleep(*delay).await;
                Some(Self::canned_text(prompt))
            }
        };

        Ok(ProviderResponse {
            text,
            input_tokens: prompt.len() as i32 / 4,
            output_tokens: 10,
            finish_reason: FinishReason::Complete,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        match self.behaviour {
            MockBehaviour::Unavailable => {
                Err(ProviderError::Unavailable("Mock provider down".to_string()))
            }
            _ => Ok(()),
        }
    }
}
