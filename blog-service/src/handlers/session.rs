use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;

use super::session_id;
use crate::models::{Analytics, HistoryEntry};
use crate::startup::AppState;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub analytics: Analytics,
    pub history: Vec<HistoryEntry>,
}

/// History and analytics for the caller's session.
pub async fn get_session(State(state): State<AppState>, headers: HeaderMap) -> Json<SessionResponse> {
    let id = session_id(&headers);
    let session = state.sessions.session(&id);
    let session = session.lock().await;

    Json(SessionResponse {
        analytics: session.analytics().clone(),
        history: session.history().cloned().collect(),
        session_id: id,
    })
}
