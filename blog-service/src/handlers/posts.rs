use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

use super::session_id;
use crate::models::{
    BlogPost, DistributionRecord, GenerationRequest, GenerationResult, RequestError, Tone,
};
use crate::services::{package, BatchMode};
use crate::startup::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GeneratePostRequest {
    #[validate(length(max = 500, message = "Topic is too long"))]
    pub topic: String,
    pub tone: Option<String>,
    pub target_length: Option<u32>,
    #[validate(length(max = 200, message = "Target audience is too long"))]
    pub target_audience: Option<String>,
    pub include_hashtags: Option<bool>,
    pub include_call_to_action: Option<bool>,
}

impl GeneratePostRequest {
    fn into_request(self, state: &AppState) -> Result<GenerationRequest, RequestError> {
        let mut builder = GenerationRequest::builder(self.topic).bounds(state.bounds());
        if let Some(tone) = self.tone {
            builder = builder.tone(tone.parse::<Tone>()?);
        }
        if let Some(length) = self.target_length {
            builder = builder.target_length(length);
        }
        if let Some(audience) = self.target_audience {
            builder = builder.target_audience(audience);
        }
        if let Some(include) = self.include_hashtags {
            builder = builder.include_hashtags(include);
        }
        if let Some(include) = self.include_call_to_action {
            builder = builder.include_call_to_action(include);
        }
        builder.build()
    }
}

#[derive(Debug, Serialize)]
pub struct ExportNames {
    pub json: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct GeneratePostResponse {
    pub result: GenerationResult,
    pub post: BlogPost,
    pub export_files: ExportNames,
}

impl GeneratePostResponse {
    fn from_result(result: GenerationResult) -> Result<Self, AppError> {
        let bundle = package(&result)?;
        Ok(Self {
            post: result.post(),
            export_files: ExportNames {
                json: bundle.json_file_name(),
                text: bundle.text_file_name(),
            },
            result,
        })
    }
}

#[tracing::instrument(skip(state, headers, request))]
pub async fn generate_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<GeneratePostRequest>,
) -> Result<(StatusCode, Json<GeneratePostResponse>), AppError> {
    request.validate()?;
    let request = request.into_request(&state)?;

    let session = state.sessions.session(&session_id(&headers));
    let mut session = session.lock().await;
    let result = state.pipeline.run(&request, &mut session).await?;

    Ok((
        StatusCode::CREATED,
        Json(GeneratePostResponse::from_result(result)?),
    ))
}

#[derive(Debug, Deserialize, Validate)]
pub struct BatchGenerateRequest {
    #[validate(
        length(min = 1, max = 10, message = "Between 1 and 10 requests per batch"),
        nested
    )]
    pub requests: Vec<GeneratePostRequest>,
}

#[derive(Debug, Serialize)]
pub struct BatchItemError {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchItem {
    Ok(GeneratePostResponse),
    Error(BatchItemError),
}

#[derive(Debug, Serialize)]
pub struct BatchGenerateResponse {
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<BatchItem>,
}

fn item_error(kind: &'static str, message: impl ToString) -> BatchItem {
    BatchItem::Error(BatchItemError {
        kind,
        message: message.to_string(),
    })
}

#[tracing::instrument(skip(state, headers, batch))]
pub async fn generate_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(batch): Json<BatchGenerateRequest>,
) -> Result<Json<BatchGenerateResponse>, AppError> {
    batch.validate()?;

    let session = state.sessions.session(&session_id(&headers));
    let mut session = session.lock().await;

    // Rejected requests keep their slot; `None` marks one sent to the pipeline.
    let mut slots = Vec::with_capacity(batch.requests.len());
    let mut requests = Vec::new();
    for raw in batch.requests {
        match raw.into_request(&state) {
            Ok(request) => {
                requests.push(request);
                slots.push(None);
            }
            Err(e) => slots.push(Some(item_error("invalid_request", e))),
        }
    }

    let mut outcomes = state
        .pipeline
        .generate_many(&requests, &mut session)
        .await
        .into_iter();

    let items: Vec<BatchItem> = slots
        .into_iter()
        .map(|slot| match slot {
            Some(item) => item,
            None => match outcomes.next() {
                Some(Ok(result)) => match GeneratePostResponse::from_result(result) {
                    Ok(response) => BatchItem::Ok(response),
                    Err(e) => item_error("packaging", e),
                },
                Some(Err(e)) => item_error(e.kind(), e),
                None => item_error("internal", "missing pipeline outcome"),
            },
        })
        .collect();

    let succeeded = items
        .iter()
        .filter(|i| matches!(i, BatchItem::Ok(_)))
        .count();
    tracing::info!(succeeded, total = items.len(), "Batch generation finished");

    Ok(Json(BatchGenerateResponse {
        succeeded,
        failed: items.len() - succeeded,
        items,
    }))
}

#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Text,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub result: GenerationResult,
}

#[tracing::instrument(skip(request))]
pub async fn export_post(
    Query(query): Query<ExportQuery>,
    Json(request): Json<ExportRequest>,
) -> Result<Response, AppError> {
    let bundle = package(&request.result)?;

    let (file_name, content_type) = match query.format {
        ExportFormat::Json => (bundle.json_file_name(), "application/json"),
        ExportFormat::Text => (bundle.text_file_name(), "text/plain; charset=utf-8"),
    };
    let body = match query.format {
        ExportFormat::Json => bundle.json,
        ExportFormat::Text => bundle.text,
    };

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name))
        .map_err(|e| AppError::InternalError(anyhow::Error::new(e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

#[derive(Debug, Deserialize, Validate)]
pub struct DistributeRequest {
    pub result: GenerationResult,
    #[validate(length(max = 50, message = "At most 50 recipients per distribution"))]
    #[serde(default)]
    pub recipients: Vec<String>,
    /// Attach the JSON and text exports to the email.
    #[serde(default)]
    pub attach_exports: bool,
}

/// Requested recipients, or the configured default when none were given.
fn recipients_or_default(state: &AppState, recipients: Vec<String>) -> Vec<String> {
    if recipients.is_empty() {
        state
            .config
            .email
            .default_recipient
            .iter()
            .cloned()
            .collect()
    } else {
        recipients
    }
}

#[tracing::instrument(skip(state, headers, request))]
pub async fn distribute_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<DistributeRequest>,
) -> Result<Json<DistributionRecord>, AppError> {
    request.validate()?;

    let recipients = recipients_or_default(&state, request.recipients);
    let bundle = package(&request.result)?;
    let record = state
        .dispatcher
        .send(&bundle, &recipients, request.attach_exports)
        .await;

    state
        .sessions
        .session(&session_id(&headers))
        .lock()
        .await
        .record_distribution(&record);

    Ok(Json(record))
}

#[derive(Debug, Deserialize, Validate)]
pub struct DistributeBatchRequest {
    #[validate(length(min = 1, max = 10, message = "Between 1 and 10 posts per distribution"))]
    pub results: Vec<GenerationResult>,
    #[validate(length(max = 50, message = "At most 50 recipients per distribution"))]
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub mode: BatchMode,
    #[serde(default)]
    pub attach_exports: bool,
}

#[derive(Debug, Serialize)]
pub struct DistributeBatchResponse {
    pub records: Vec<DistributionRecord>,
}

#[tracing::instrument(skip(state, headers, request), fields(mode = ?request.mode))]
pub async fn distribute_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<DistributeBatchRequest>,
) -> Result<Json<DistributeBatchResponse>, AppError> {
    request.validate()?;

    let bundles = request
        .results
        .iter()
        .map(package)
        .collect::<Result<Vec<_>, _>>()?;
    let recipients = recipients_or_default(&state, request.recipients);

    let records = state
        .dispatcher
        .send_many(&bundles, &recipients, request.mode, request.attach_exports)
        .await;

    let session = state.sessions.session(&session_id(&headers));
    let mut session = session.lock().await;
    for record in &records {
        session.record_distribution(record);
    }

    Ok(Json(DistributeBatchResponse { records }))
}
