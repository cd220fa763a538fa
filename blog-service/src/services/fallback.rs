//! Single-shot recovery from recoverable generation failures.

use super::generation::{call_provider, GenerationError};
use super::prompt;
use super::providers::{GenerationParams, TextProvider};
use super::template::{self, TEMPLATE_MODEL};
use crate::models::{GenerationRequest, GenerationResult};
use std::sync::Arc;
use std::time::Duration;

/// What to do when the primary provider fails recoverably.
#[derive(Clone)]
pub enum FallbackStrategy {
    /// Ask a second model once.
    SecondaryModel(Arc<dyn TextProvider>),
    /// Render the deterministic template.
    Template,
    /// Surface the primary error unchanged.
    Disabled,
}

impl FallbackStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            FallbackStrategy::SecondaryModel(_) => "model",
            FallbackStrategy::Template => "template",
            FallbackStrategy::Disabled => "disabled",
        }
    }
}

#[derive(Clone)]
pub struct FallbackSelector {
    strategy: FallbackStrategy,
    params: GenerationParams,
    timeout: Duration,
}

impl FallbackSelector {
    pub fn new(strategy: FallbackStrategy, params: GenerationParams, timeout: Duration) -> Self {
        Self {
            strategy,
            params,
            timeout,
        }
    }

    pub fn strategy(&self) -> &FallbackStrategy {
        &self.strategy
    }

    /// Make at most one alternate attempt for `request` after `error`.
    ///
    /// `Fatal` errors and a disabled strategy return `error` untouched. A
    /// failing secondary model returns its own error.
    #[tracing::instrument(skip(self, request), fields(strategy = self.strategy.name(), cause = error.kind()))]
    pub async fn select(
        &self,
        request: &GenerationRequest,
        error: GenerationError,
    ) -> Result<GenerationResult, GenerationError> {
        if !error.is_recoverable() {
            return Err(error);
        }

        match &self.strategy {
            FallbackStrategy::Disabled => Err(error),
            FallbackStrategy::Template => {
                tracing::info!("Primary provider failed, answering from template");
                Ok(GenerationResult::fallback(
                    request,
                    template::render(request),
                    TEMPLATE_MODEL,
                ))
            }
            FallbackStrategy::SecondaryModel(provider) => {
                tracing::info!(model = provider.model(), "Primary provider failed, trying secondary model");
                let prompt = prompt::blog_prompt(request);
                let text =
                    call_provider(provider.as_ref(), &prompt, &self.params, self.timeout).await?;
                Ok(GenerationResult::fallback(request, text, provider.model()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;
    use crate::services::providers::{MockBehaviour, MockTextProvider};

    fn request() -> GenerationRequest {
        GenerationRequest::builder("AI trends").build().unwrap()
    }

    fn selector(strategy: FallbackStrategy) -> FallbackSelector {
        FallbackSelector::new(strategy, GenerationParams::default(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn fatal_is_never_recovered() {
        let secondary = Arc::new(MockTextProvider::succeeding("secondary"));
        let err = selector(FallbackStrategy::SecondaryModel(secondary.clone()))
            .select(&request(), GenerationError::Fatal("bad key".into()))
            .await
            .unwrap_err();

        assert_eq!(err, GenerationError::Fatal("bad key".into()));
        assert_eq!(secondary.call_count(), 0);
    }

    #[tokio::test]
    async fn template_answers_quota_errors() {
        let result = selector(FallbackStrategy::Template)
            .select(&request(), GenerationError::QuotaExceeded("quota".into()))
            .await
            .unwrap();

        assert_eq!(result.provider(), Provenance::Fallback);
        assert_eq!(result.model(), TEMPLATE_MODEL);
        assert!(!result.text().is_empty());
    }

    #[tokio::test]
    async fn disabled_surfaces_original_error() {
        let err = selector(FallbackStrategy::Disabled)
            .select(&request(), GenerationError::Transient("down".into()))
            .await
            .unwrap_err();

        assert_eq!(err, GenerationError::Transient("down".into()));
    }

    #[tokio::test]
    async fn secondary_model_is_called_exactly_once() {
        let secondary = Arc::new(MockTextProvider::succeeding("secondary"));
        let result = selector(FallbackStrategy::SecondaryModel(secondary.clone()))
            .select(&request(), GenerationError::Transient("down".into()))
            .await
            .unwrap();

        assert_eq!(result.provider(), Provenance::Fallback);
        assert_eq!(result.model(), "secondary");
        assert_eq!(secondary.call_count(), 1);
    }

    #[tokio::test]
    async fn failing_secondary_returns_its_error_without_retry() {
        let secondary = Arc::new(MockTextProvider::new("secondary", MockBehaviour::Unavailable));
        let err = selector(FallbackStrategy::SecondaryModel(secondary.clone()))
            .select(&request(), GenerationError::QuotaExceeded("quota".into()))
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Transient(_)));
        assert_eq!(secondary.call_count(), 1);
    }
}
