//! Application startup and lifecycle management.

use crate::config::{BlogConfig, FallbackStrategyKind, ProviderKind};
use crate::handlers::{
    health_check, metrics::metrics_handler, posts, readiness_check, session::get_session,
    topics::suggest_topics,
};
use crate::models::LengthBounds;
use crate::services::email::{EmailProvider, MockEmailProvider, SmtpProvider};
use crate::services::providers::{
    GeminiConfig, GeminiTextProvider, GenerationParams, MockTextProvider, TextProvider,
};
use crate::services::{
    BlogPipeline, DistributionDispatcher, FallbackSelector, FallbackStrategy, GenerationClient,
    SessionStore,
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BlogConfig>,
    pub pipeline: BlogPipeline,
    pub dispatcher: DistributionDispatcher,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn bounds(&self) -> LengthBounds {
        self.pipeline.client().bounds()
    }
}

/// Outbound collaborators the application is wired with.
pub struct Dependencies {
    pub text_provider: Arc<dyn TextProvider>,
    pub fallback: FallbackStrategy,
    pub email_provider: Arc<dyn EmailProvider>,
}

fn text_provider(config: &BlogConfig, model: &str) -> Result<Arc<dyn TextProvider>, AppError> {
    match config.models.provider {
        ProviderKind::Gemini => {
            let provider = GeminiTextProvider::new(GeminiConfig {
                api_key: config.google.api_key.clone(),
                model: model.to_string(),
                api_base: config.google.api_base.clone(),
                request_timeout: config.generation.timeout(),
            })
            .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;
            Ok(Arc::new(provider))
        }
        ProviderKind::Mock => Ok(Arc::new(MockTextProvider::succeeding(model))),
    }
}

impl Dependencies {
    pub fn from_config(config: &BlogConfig) -> Result<Self, AppError> {
        let primary = text_provider(config, &config.models.primary_model)?;
        tracing::info!(
            provider = primary.name(),
            model = primary.model(),
            "Primary text provider initialized"
        );

        let fallback = match config.fallback.strategy {
            FallbackStrategyKind::Model => FallbackStrategy::SecondaryModel(text_provider(
                config,
                &config.models.fallback_model,
            )?),
            FallbackStrategyKind::Template => FallbackStrategy::Template,
            FallbackStrategyKind::Disabled => FallbackStrategy::Disabled,
        };
        tracing::info!(strategy = fallback.name(), "Fallback strategy configured");

        let email_provider: Arc<dyn EmailProvider> = if config.smtp.enabled {
            match SmtpProvider::new(config.smtp.clone()) {
                Ok(provider) => {
                    tracing::info!("SMTP email provider initialized");
                    Arc::new(provider)
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize SMTP provider: {}. Using mock.", e);
                    Arc::new(MockEmailProvider::new(true))
                }
            }
        } else {
            tracing::info!("SMTP provider disabled, using mock email provider");
            Arc::new(MockEmailProvider::new(true))
        };

        Ok(Self {
            text_provider: primary,
            fallback,
            email_provider,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/posts", post(posts::generate_post))
        .route("/api/v1/posts/batch", post(posts::generate_batch))
        .route("/api/v1/posts/export", post(posts::export_post))
        .route("/api/v1/posts/distribute", post(posts::distribute_post))
        .route(
            "/api/v1/posts/distribute/batch",
            post(posts::distribute_batch),
        )
        .route("/api/v1/topics/suggestions", post(suggest_topics))
        .route("/api/v1/session", get(get_session))
        .route_layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    http_listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with providers chosen from configuration.
    pub async fn build(config: BlogConfig) -> Result<Self, AppError> {
        let dependencies = Dependencies::from_config(&config)?;
        Self::build_with(config, dependencies).await
    }

    pub async fn build_with(config: BlogConfig, deps: Dependencies) -> Result<Self, AppError> {
        let params = GenerationParams {
            temperature: Some(config.generation.temperature),
            max_tokens: Some(config.generation.max_output_tokens),
        };
        let timeout = config.generation.timeout();

        let client = GenerationClient::new(
            deps.text_provider,
            params.clone(),
            config.generation.bounds(),
            timeout,
        );
        let fallback = FallbackSelector::new(deps.fallback, params, timeout);
        let dispatcher = DistributionDispatcher::new(
            deps.email_provider,
            config.email.subject_prefix.clone(),
            config.email.send_timeout(),
        );

        let sessions = SessionStore::new(
            config.sessions.max_sessions,
            config.sessions.idle_timeout(),
        );

        // Port 0 binds a random port for testing
        let http_addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", http_addr, e);
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        tracing::info!("Blog service: HTTP on port {}", http_port);

        Ok(Self {
            http_port,
            http_listener,
            state: AppState {
                config: Arc::new(config),
                pipeline: BlogPipeline::new(client, fallback),
                dispatcher,
                sessions,
            },
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.http_listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        EmailConfig, FallbackConfig, GenerationConfig, GoogleConfig, ModelConfig, SessionConfig,
        SmtpConfig,
    };

    fn config(provider: ProviderKind, strategy: FallbackStrategyKind) -> BlogConfig {
        BlogConfig {
            common: service_core::config::Config {
                port: 0,
                log_level: "debug".to_string(),
                otlp_endpoint: None,
            },
            google: GoogleConfig {
                api_key: String::new(),
                api_base: crate::config::DEFAULT_GEMINI_API_BASE.to_string(),
            },
            models: ModelConfig {
                provider,
                primary_model: "primary-model".to_string(),
                fallback_model: "secondary-model".to_string(),
            },
            generation: GenerationConfig {
                timeout_secs: 5,
                min_words: 50,
                max_words: 2000,
                temperature: 0.7,
                max_output_tokens: 2048,
            },
            fallback: FallbackConfig { strategy },
            smtp: SmtpConfig {
                host: "localhost".to_string(),
                port: 2525,
                user: String::new(),
                password: String::new(),
                from_email: "agent@example.com".to_string(),
                from_name: "LinkedIn Blog Agent".to_string(),
                enabled: false,
            },
            email: EmailConfig {
                send_timeout_secs: 5,
                subject_prefix: "Generated LinkedIn Blog Post".to_string(),
                default_recipient: None,
            },
            sessions: SessionConfig {
                max_sessions: 100,
                idle_timeout_secs: 3600,
            },
        }
    }

    #[test]
    fn model_strategy_wires_a_secondary_provider() {
        let deps =
            Dependencies::from_config(&config(ProviderKind::Mock, FallbackStrategyKind::Model))
                .unwrap();

        assert_eq!(deps.text_provider.model(), "primary-model");
        assert_eq!(deps.fallback.name(), "model");
        match &deps.fallback {
            FallbackStrategy::SecondaryModel(secondary) => {
                assert_eq!(secondary.model(), "secondary-model")
            }
            _ => panic!("expected a secondary model"),
        }
    }

    #[test]
    fn template_and_disabled_strategies_need_no_provider() {
        for (kind, name) in [
            (FallbackStrategyKind::Template, "template"),
            (FallbackStrategyKind::Disabled, "disabled"),
        ] {
            let deps = Dependencies::from_config(&config(ProviderKind::Mock, kind)).unwrap();
            assert_eq!(deps.fallback.name(), name);
        }
    }
}
