//! Session-scoped history and analytics.
//!
//! A `SessionState` is created explicitly and handed to each pipeline call;
//! nothing here is global.

use super::distribution::{DistributionRecord, SendStatus};
use super::request::{GenerationRequest, Tone};
use super::result::{GenerationResult, Provenance};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::Display;

/// Oldest entries are dropped beyond this many.
pub const MAX_HISTORY: usize = 100;

/// One generation attempt, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub topic: String,
    pub tone: Tone,
    pub target_length: u32,
    pub provenance: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analytics {
    pub total_requests: u64,
    pub primary_successes: u64,
    pub fallback_successes: u64,
    pub failures: u64,
    pub distributions: u64,
    pub emails_sent: u64,
    pub emails_failed: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    history: VecDeque<HistoryEntry>,
    analytics: Analytics,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    pub fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    pub fn record_success(&mut self, request: &GenerationRequest, result: &GenerationResult) {
        self.analytics.total_requests += 1;
        match result.provider() {
            Provenance::Primary => self.analytics.primary_successes += 1,
            Provenance::Fallback => self.analytics.fallback_successes += 1,
            Provenance::None => {}
        }

        self.push(HistoryEntry {
            topic: request.topic().to_string(),
            tone: request.tone(),
            target_length: request.target_length(),
            provenance: result.provider(),
            result_id: Some(result.id().to_string()),
            title: Some(result.post().display_title().to_string()),
            error: None,
            timestamp: result.timestamp(),
        });
    }

    pub fn record_failure(&mut self, request: &GenerationRequest, error: &impl Display) {
        self.analytics.total_requests += 1;
        self.analytics.failures += 1;

        self.push(HistoryEntry {
            topic: request.topic().to_string(),
            tone: request.tone(),
            target_length: request.target_length(),
            provenance: Provenance::None,
            result_id: None,
            title: None,
            error: Some(error.to_string()),
            timestamp: Utc::now(),
        });
    }

    pub fn record_distribution(&mut self, record: &DistributionRecord) {
        self.analytics.distributions += 1;
        for outcome in &record.recipients {
            match outcome.status {
                SendStatus::Sent => self.analytics.emails_sent += 1,
                _ => self.analytics.emails_failed += 1,
            }
        }
    }

    fn push(&mut self, entry: HistoryEntry) {
        if self.history.len() == MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(entry);
    }
}
