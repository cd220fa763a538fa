use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::startup::AppState;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "blog-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness: the primary text provider and the email transport both answer.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let provider = state.pipeline.client().provider();
    let email = state.dispatcher.provider();

    let provider_check = provider.health_check().await;
    let email_check = email.health_check().await;

    let status = if provider_check.is_ok() && email_check.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    if let Err(e) = &provider_check {
        tracing::warn!(provider = provider.name(), error = %e, "Text provider not ready");
    }
    if let Err(e) = &email_check {
        tracing::warn!(error = %e, "Email transport not ready");
    }

    (
        status,
        Json(json!({
            "status": if status == StatusCode::OK { "ready" } else { "unavailable" },
            "checks": {
                "text_provider": {
                    "name": provider.name(),
                    "model": provider.model(),
                    "ok": provider_check.is_ok(),
                    "error": provider_check.err().map(|e| e.to_string()),
                },
                "email": {
                    "enabled": email.is_enabled(),
                    "ok": email_check.is_ok(),
                    "error": email_check.err().map(|e| e.to_string()),
                }
            }
        })),
    )
}
