use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

use crate::startup::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct TopicSuggestionRequest {
    #[validate(length(min = 1, max = 100, message = "Industry must be 1-100 characters"))]
    pub industry: String,
    #[validate(length(max = 20, message = "At most 20 keywords"))]
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TopicSuggestionResponse {
    pub industry: String,
    pub topics: Vec<String>,
}

#[tracing::instrument(skip(state, request))]
pub async fn suggest_topics(
    State(state): State<AppState>,
    Json(request): Json<TopicSuggestionRequest>,
) -> Result<Json<TopicSuggestionResponse>, AppError> {
    request.validate()?;

    let topics = state
        .pipeline
        .client()
        .suggest_topics(request.industry.trim(), &request.keywords)
        .await;

    tracing::info!(industry = %request.industry, count = topics.len(), "Topic suggestions ready");

    Ok(Json(TopicSuggestionResponse {
        industry: request.industry,
        topics,
    }))
}
