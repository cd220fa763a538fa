//! Generation pipeline: primary call, optional fallback, session bookkeeping.

use super::fallback::FallbackSelector;
use super::generation::{GenerationClient, GenerationError};
use super::metrics;
use crate::models::{GenerationRequest, GenerationResult, Provenance, SessionState};

#[derive(Clone)]
pub struct BlogPipeline {
    client: GenerationClient,
    fallback: FallbackSelector,
}

impl BlogPipeline {
    pub fn new(client: GenerationClient, fallback: FallbackSelector) -> Self {
        Self { client, fallback }
    }

    pub fn client(&self) -> &GenerationClient {
        &self.client
    }

    pub fn fallback(&self) -> &FallbackSelector {
        &self.fallback
    }

    /// Generate one post and record the attempt in `session`.
    ///
    /// Returns a result tagged `primary` or `fallback`, or an error; a
    /// recoverable primary failure gets exactly one fallback attempt.
    #[tracing::instrument(skip(self, request, session), fields(topic = %request.topic(), tone = %request.tone()))]
    pub async fn run(
        &self,
        request: &GenerationRequest,
        session: &mut SessionState,
    ) -> Result<GenerationResult, GenerationError> {
        let outcome = match self.client.generate(request).await {
            Ok(result) => Ok(result),
            Err(error) if error.is_recoverable() => self.fallback.select(request, error).await,
            Err(error) => Err(error),
        };

        match &outcome {
            Ok(result) => {
                metrics::record_generation(result.provider().as_str());
                session.record_success(request, result);
                tracing::info!(
                    result_id = %result.id(),
                    provenance = %result.provider(),
                    model = result.model(),
                    "Blog post ready"
                );
            }
            Err(error) => {
                metrics::record_generation(Provenance::None.as_str());
                session.record_failure(request, error);
                tracing::warn!(error_kind = error.kind(), error = %error, "Blog post generation failed");
            }
        }

        outcome
    }

    /// Run each request in order; one failure does not stop the rest.
    pub async fn generate_many(
        &self,
        requests: &[GenerationRequest],
        session: &mut SessionState,
    ) -> Vec<Result<GenerationResult, GenerationError>> {
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in requests {
            outcomes.push(self.run(request, session).await);
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LengthBounds, Tone};
    use crate::services::fallback::FallbackStrategy;
    use crate::services::providers::{GenerationParams, MockBehaviour, MockTextProvider};
    use std::sync::Arc;
    use std::time::Duration;

    fn pipeline(primary: Arc<MockTextProvider>, strategy: FallbackStrategy) -> BlogPipeline {
        let timeout = Duration::from_secs(5);
        BlogPipeline::new(
            GenerationClient::new(
                primary,
                GenerationParams::default(),
                LengthBounds::default(),
                timeout,
            ),
            FallbackSelector::new(strategy, GenerationParams::default(), timeout),
        )
    }

    fn ai_trends() -> GenerationRequest {
        GenerationRequest::builder("AI trends")
            .tone(Tone::Professional)
            .target_length(500)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn quota_error_is_answered_by_fallback() {
        let primary = Arc::new(MockTextProvider::new("primary", MockBehaviour::RateLimited));
        let mut session = SessionState::new();

        let result = pipeline(primary.clone(), FallbackStrategy::Template)
            .run(&ai_trends(), &mut session)
            .await
            .unwrap();

        assert_eq!(result.provider(), Provenance::Fallback);
        assert!(!result.text().trim().is_empty());
        assert_eq!(primary.call_count(), 1);
        assert_eq!(session.analytics().fallback_successes, 1);
    }

    #[tokio::test]
    async fn fallback_runs_at_most_once() {
        let primary = Arc::new(MockTextProvider::new("primary", MockBehaviour::Unavailable));
        let secondary = Arc::new(MockTextProvider::new("secondary", MockBehaviour::RateLimited));
        let mut session = SessionState::new();

        let err = pipeline(primary.clone(), FallbackStrategy::SecondaryModel(secondary.clone()))
            .run(&ai_trends(), &mut session)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::QuotaExceeded(_)));
        assert_eq!(primary.call_count(), 1);
        assert_eq!(secondary.call_count(), 1);
        assert_eq!(session.analytics().failures, 1);
    }

    #[tokio::test]
    async fn fatal_errors_skip_fallback() {
        let primary = Arc::new(MockTextProvider::new("primary", MockBehaviour::Reject));
        let secondary = Arc::new(MockTextProvider::succeeding("secondary"));
        let mut session = SessionState::new();

        let err = pipeline(primary, FallbackStrategy::SecondaryModel(secondary.clone()))
            .run(&ai_trends(), &mut session)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Fatal(_)));
        assert_eq!(secondary.call_count(), 0);
        let last = session.history().last().unwrap();
        assert_eq!(last.provenance, Provenance::None);
        assert!(last.error.is_some());
    }

    #[tokio::test]
    async fn batch_keeps_going_after_failure() {
        let primary = Arc::new(MockTextProvider::succeeding("primary"));
        let narrow = BlogPipeline::new(
            GenerationClient::new(
                primary,
                GenerationParams::default(),
                LengthBounds { min: 50, max: 600 },
                Duration::from_secs(5),
            ),
            FallbackSelector::new(
                FallbackStrategy::Template,
                GenerationParams::default(),
                Duration::from_secs(5),
            ),
        );
        let too_long = GenerationRequest::builder("cloud costs")
            .target_length(1500)
            .build()
            .unwrap();
        let mut session = SessionState::new();

        let outcomes = narrow
            .generate_many(&[too_long, ai_trends()], &mut session)
            .await;

        assert!(matches!(outcomes[0], Err(GenerationError::Fatal(_))));
        assert_eq!(outcomes[1].as_ref().unwrap().provider(), Provenance::Primary);
        assert_eq!(session.analytics().total_requests, 2);
    }
}
