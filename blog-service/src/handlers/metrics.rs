use axum::{http::header, response::IntoResponse};

use crate::services::metrics::get_metrics;

pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        get_metrics(),
    )
}
