//! Distribution record: the outcome ledger of emailing a result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    Pending,
    Sent,
    Failed,
}

impl fmt::Display for SendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendStatus::Pending => write!(f, "pending"),
            SendStatus::Sent => write!(f, "sent"),
            SendStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Per-recipient failure.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum DistributionError {
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Send failed: {0}")]
    SendFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientOutcome {
    pub address: String,
    pub status: SendStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DistributionError>,
}

impl RecipientOutcome {
    pub fn pending(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            status: SendStatus::Pending,
            provider_id: None,
            error: None,
        }
    }

    pub fn mark_sent(&mut self, provider_id: Option<String>) {
        self.status = SendStatus::Sent;
        self.provider_id = provider_id;
        self.error = None;
    }

    pub fn mark_failed(&mut self, error: DistributionError) {
        self.status = SendStatus::Failed;
        self.provider_id = None;
        self.error = Some(error);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub total_recipients: usize,
    pub valid_emails: usize,
    pub invalid_emails: usize,
    pub emails_sent: usize,
    pub emails_failed: usize,
}

/// One distribution attempt across a set of recipients.
///
/// Starts `pending`; [`DistributionRecord::resolve`] makes it terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionRecord {
    pub distribution_id: String,
    pub result_id: String,
    pub status: SendStatus,
    pub recipients: Vec<RecipientOutcome>,
    pub summary: DistributionSummary,
    pub created_utc: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_utc: Option<DateTime<Utc>>,
}

impl DistributionRecord {
    pub fn new(result_id: impl Into<String>, recipients: Vec<RecipientOutcome>) -> Self {
        Self {
            distribution_id: Uuid::new_v4().to_string(),
            result_id: result_id.into(),
            status: SendStatus::Pending,
            summary: DistributionSummary {
                total_recipients: recipients.len(),
                ..DistributionSummary::default()
            },
            recipients,
            created_utc: Utc::now(),
            completed_utc: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status != SendStatus::Pending
    }

    /// Fold recipient outcomes into the overall status.
    ///
    /// `sent` only when there is at least one recipient and every one of
    /// them was delivered. Recipients still pending count as failures.
    pub fn resolve(&mut self) {
        if self.is_terminal() {
            return;
        }

        for outcome in &mut self.recipients {
            if outcome.status == SendStatus::Pending {
                outcome.mark_failed(DistributionError::SendFailed(
                    "delivery was never attempted".to_string(),
                ));
            }
        }

        let invalid = self
            .recipients
            .iter()
            .filter(|o| matches!(o.error, Some(DistributionError::InvalidRecipient(_))))
            .count();
        let sent = self
            .recipients
            .iter()
            .filter(|o| o.status == SendStatus::Sent)
            .count();

        self.summary = DistributionSummary {
            total_recipients: self.recipients.len(),
            valid_emails: self.recipients.len() - invalid,
            invalid_emails: invalid,
            emails_sent: sent,
            emails_failed: self.recipients.len() - sent,
        };

        self.status = if !self.recipients.is_empty() && sent == self.recipients.len() {
            SendStatus::Sent
        } else {
            SendStatus::Failed
        };
        self.completed_utc = Some(Utc::now());
    }
}
