//! HTTP handlers for blog-service.

pub mod health;
pub mod metrics;
pub mod posts;
pub mod session;
pub mod topics;

use crate::models::RequestError;
use crate::services::session_store::{ANONYMOUS_SESSION, SESSION_HEADER};
use crate::services::{GenerationError, PackagingError};
use axum::http::HeaderMap;
use service_core::error::AppError;

pub use health::{health_check, readiness_check};

/// Seconds a client should wait after a quota error.
const QUOTA_RETRY_AFTER_SECS: u64 = 60;

impl From<GenerationError> for AppError {
    fn from(error: GenerationError) -> Self {
        match error {
            GenerationError::QuotaExceeded(msg) => AppError::TooManyRequests(
                format!("API quota exceeded: {}", msg),
                Some(QUOTA_RETRY_AFTER_SECS),
            ),
            GenerationError::Transient(msg) => AppError::ServiceUnavailable(msg),
            GenerationError::Fatal(msg) => AppError::BadGateway(msg),
        }
    }
}

impl From<RequestError> for AppError {
    fn from(error: RequestError) -> Self {
        AppError::UnprocessableEntity(anyhow::Error::new(error))
    }
}

impl From<PackagingError> for AppError {
    fn from(error: PackagingError) -> Self {
        AppError::InternalError(anyhow::Error::new(error))
    }
}

/// Session id from the request headers, or the shared anonymous session.
pub(crate) fn session_id(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(ANONYMOUS_SESSION)
        .to_string()
}
