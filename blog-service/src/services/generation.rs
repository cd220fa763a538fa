//! Primary generation client and the generation error taxonomy.

use super::metrics;
use super::prompt;
use super::providers::{GenerationParams, ProviderError, TextProvider};
use crate::models::{GenerationRequest, GenerationResult, LengthBounds};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Failure of a generation attempt.
///
/// `QuotaExceeded` and `Transient` are recoverable through the fallback
/// selector; `Fatal` never is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("API quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Transient provider failure: {0}")]
    Transient(String),

    #[error("Generation failed: {0}")]
    Fatal(String),
}

impl GenerationError {
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GenerationError::QuotaExceeded(_) | GenerationError::Transient(_)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::QuotaExceeded(_) => "quota_exceeded",
            GenerationError::Transient(_) => "transient",
            GenerationError::Fatal(_) => "fatal",
        }
    }
}

impl From<ProviderError> for GenerationError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::RateLimited(msg) => GenerationError::QuotaExceeded(msg),
            ProviderError::Unavailable(msg) | ProviderError::NetworkError(msg) => {
                GenerationError::Transient(msg)
            }
            other @ (ProviderError::NotConfigured(_)
            | ProviderError::ApiError { .. }
            | ProviderError::InvalidRequest(_)
            | ProviderError::ContentFiltered
            | ProviderError::EmptyResponse) => GenerationError::Fatal(other.to_string()),
        }
    }
}

/// One bounded call to a provider, returning non-empty text.
///
/// Shared by the primary client and the secondary-model fallback.
pub(crate) async fn call_provider(
    provider: &dyn TextProvider,
    prompt: &str,
    params: &GenerationParams,
    timeout: Duration,
) -> Result<String, GenerationError> {
    let started = Instant::now();
    let outcome = tokio::time::timeout(timeout, provider.generate(prompt, params)).await;
    metrics::observe_provider_latency(provider.name(), provider.model(), started.elapsed());

    let error = match outcome {
        Ok(Ok(response)) => match response.text {
            Some(text) if !text.trim().is_empty() => {
                tracing::debug!(
                    provider = provider.name(),
                    model = provider.model(),
                    input_tokens = response.input_tokens,
                    output_tokens = response.output_tokens,
                    "Provider call completed"
                );
                return Ok(text);
            }
            _ => GenerationError::from(ProviderError::EmptyResponse),
        },
        Ok(Err(provider_error)) => GenerationError::from(provider_error),
        Err(_) => GenerationError::Transient(format!(
            "{} did not answer within {}s",
            provider.model(),
            timeout.as_secs()
        )),
    };

    metrics::record_provider_error(provider.name(), error.kind());
    tracing::warn!(
        provider = provider.name(),
        model = provider.model(),
        error_kind = error.kind(),
        error = %error,
        "Provider call failed"
    );
    Err(error)
}

/// Calls the primary provider for a request.
#[derive(Clone)]
pub struct GenerationClient {
    provider: Arc<dyn TextProvider>,
    params: GenerationParams,
    bounds: LengthBounds,
    timeout: Duration,
}

impl GenerationClient {
    pub fn new(
        provider: Arc<dyn TextProvider>,
        params: GenerationParams,
        bounds: LengthBounds,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            params,
            bounds,
            timeout,
        }
    }

    pub fn provider(&self) -> &Arc<dyn TextProvider> {
        &self.provider
    }

    pub fn bounds(&self) -> LengthBounds {
        self.bounds
    }

    /// Generate a post with the primary provider.
    ///
    /// A request whose length falls outside this client's bounds is `Fatal`
    /// and never reaches the provider.
    #[tracing::instrument(skip(self, request), fields(topic = %request.topic(), model = %self.provider.model()))]
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        if request.topic().trim().is_empty() {
            return Err(GenerationError::Fatal("topic is empty".to_string()));
        }
        self.bounds
            .check(request.target_length())
            .map_err(|e| GenerationError::Fatal(e.to_string()))?;

        let prompt = prompt::blog_prompt(request);
        let text = call_provider(self.provider.as_ref(), &prompt, &self.params, self.timeout).await?;

        tracing::info!("Blog post generated by primary provider");
        Ok(GenerationResult::primary(request, text, self.provider.model()))
    }

    /// Ask the primary provider for topic ideas. Failures yield an empty list.
    #[tracing::instrument(skip(self, keywords))]
    pub async fn suggest_topics(&self, industry: &str, keywords: &[String]) -> Vec<String> {
        let prompt = prompt::topic_prompt(industry, keywords);
        match call_provider(self.provider.as_ref(), &prompt, &self.params, self.timeout).await {
            Ok(text) => prompt::parse_topic_list(&text),
            Err(e) => {
                tracing::error!(error = %e, "Error generating topic suggestions");
                Vec::new()
            }
        }
    }
}
