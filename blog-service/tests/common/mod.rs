//! Test helpers for blog-service integration tests.
//!
//! Spawns the application on a random port against an in-process Gemini
//! stub and a mock mailbox.

#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use blog_service::config::{
    BlogConfig, EmailConfig, FallbackConfig, FallbackStrategyKind, GenerationConfig, GoogleConfig,
    ModelConfig, ProviderKind, SessionConfig, SmtpConfig,
};
use blog_service::services::email::{EmailProvider, MockEmailProvider};
use blog_service::services::metrics::init_metrics;
use blog_service::startup::{Application, Dependencies};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Models whose name starts with this answer 429 RESOURCE_EXHAUSTED.
pub const QUOTA_MODEL: &str = "quota-gemini";
/// Models whose name starts with this answer 503.
pub const DOWN_MODEL: &str = "down-gemini";
pub const GOOD_MODEL: &str = "gemini-2.0-flash";

pub const POST_TEXT: &str = "TITLE: Stubbed Insights\n\n\
    CONTENT: This post came from the stub.\n\n\
    HASHTAGS: #AI #Stub\n\n\
    CALL_TO_ACTION: Tell me what you think.";

#[derive(Clone, Default)]
struct StubState {
    calls: Arc<AtomicUsize>,
}

/// In-process stand-in for the Gemini REST API.
pub struct GeminiStub {
    pub base_url: String,
    calls: Arc<AtomicUsize>,
}

impl GeminiStub {
    pub async fn spawn() -> Self {
        let state = StubState::default();
        let calls = state.calls.clone();

        let router = Router::new()
            .route("/models", get(list_models))
            .route("/models/:call", post(generate_content))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub listener");
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            calls,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

async fn list_models() -> impl IntoResponse {
    Json(json!({ "models": [{ "name": "models/gemini-2.0-flash" }] }))
}

async fn generate_content(
    State(state): State<StubState>,
    Path(call): Path<String>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.calls.fetch_add(1, Ordering::SeqCst);
    let model = call.split(':').next().unwrap_or_default();

    if model.starts_with(QUOTA_MODEL) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": {
                    "code": 429,
                    "message": "Quota exceeded for quota metric 'Generate Content API requests per minute'",
                    "status": "RESOURCE_EXHAUSTED"
                }
            })),
        );
    }
    if model.starts_with(DOWN_MODEL) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": { "code": 503, "message": "The model is overloaded", "status": "UNAVAILABLE" }
            })),
        );
    }

    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default();
    let text = if prompt.contains("numbered list") {
        (1..=10)
            .map(|i| format!("{}. Stub topic {}", i, i))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        POST_TEXT.to_string()
    };

    (
        StatusCode::OK,
        Json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 120, "candidatesTokenCount": 80 }
        })),
    )
}

pub fn test_config(api_base: &str, primary_model: &str, strategy: FallbackStrategyKind) -> BlogConfig {
    BlogConfig {
        common: service_core::config::Config {
            port: 0,
            log_level: "debug".to_string(),
            otlp_endpoint: None,
        },
        google: GoogleConfig {
            api_key: "test-key".to_string(),
            api_base: api_base.to_string(),
        },
        models: ModelConfig {
            provider: ProviderKind::Gemini,
            primary_model: primary_model.to_string(),
            fallback_model: GOOD_MODEL.to_string(),
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

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub stub: GeminiStub,
    pub mailbox: Arc<MockEmailProvider>,
    client: reqwest::Client,
}

impl TestApp {
    /// Spawn with a working primary model and the template fallback.
    pub async fn spawn() -> Self {
        Self::spawn_with(GOOD_MODEL, FallbackStrategyKind::Template, MockEmailProvider::new(true)).await
    }

    pub async fn spawn_with(
        primary_model: &str,
        strategy: FallbackStrategyKind,
        mailbox: MockEmailProvider,
    ) -> Self {
        init_metrics();

        let stub = GeminiStub::spawn().await;
        let config = test_config(&stub.base_url, primary_model, strategy);
        let mailbox = Arc::new(mailbox);

        let mut deps = Dependencies::from_config(&config).expect("Failed to build dependencies");
        deps.email_provider = mailbox.clone() as Arc<dyn EmailProvider>;

        let app = Application::build_with(config, deps)
            .await
            .expect("Failed to build application");
        let port = app.http_port();
        tokio::spawn(app.run_until_stopped());

        Self {
            address: format!("http://127.0.0.1:{}", port),
            port,
            stub,
            mailbox,
            client: reqwest::Client::new(),
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub async fn post_json(&self, path: &str, session: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .header("x-session-id", session)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str, session: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .header("x-session-id", session)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Generate one post and return the `result` object of the response.
    pub async fn generate(&self, session: &str, topic: &str) -> Value {
        let response = self
            .post_json(
                "/api/v1/posts",
                session,
                &json!({ "topic": topic, "tone": "professional", "target_length": 500 }),
            )
            .await;
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.expect("Failed to parse response");
        body["result"].clone()
    }
}
