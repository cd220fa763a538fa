//! Emails a packaged post to a set of recipients.

use super::email::{compose, EmailAttachment, EmailError, EmailMessage, EmailProvider};
use super::metrics;
use super::packager::ExportBundle;
use crate::models::{DistributionError, DistributionRecord, RecipientOutcome};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use validator::ValidateEmail;

/// Syntactic address check: RFC-style local/domain parts plus a dotted
/// domain ending in an alphabetic TLD of two or more letters.
pub fn is_valid_recipient(address: &str) -> bool {
    if !address.validate_email() {
        return false;
    }
    let Some((_, domain)) = address.rsplit_once('@') else {
        return false;
    };
    match domain.rsplit_once('.') {
        Some((host, tld)) => {
            !host.is_empty() && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}

/// Trim, drop blanks and collapse duplicates, keeping first-seen order.
fn unique_recipients(recipients: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    recipients
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .filter(|r| seen.insert(r.to_string()))
        .map(str::to_string)
        .collect()
}

/// How several posts reach the same recipients.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    /// One email per post.
    #[default]
    Separate,
    /// A single email carrying every post.
    Combined,
}

/// A rendered email, ready to address.
struct Draft {
    subject: String,
    body_text: String,
    body_html: Option<String>,
    attachments: Vec<EmailAttachment>,
}

#[derive(Clone)]
pub struct DistributionDispatcher {
    provider: Arc<dyn EmailProvider>,
    subject_prefix: String,
    timeout: Duration,
}

impl DistributionDispatcher {
    pub fn new(provider: Arc<dyn EmailProvider>, subject_prefix: String, timeout: Duration) -> Self {
        Self {
            provider,
            subject_prefix,
            timeout,
        }
    }

    pub fn provider(&self) -> &Arc<dyn EmailProvider> {
        &self.provider
    }

    /// Deliver `bundle` to every recipient and return the terminal record.
    ///
    /// Invalid addresses fail individually; valid ones are still attempted.
    /// With `attach_exports` the JSON and text exports ride along as files.
    #[tracing::instrument(skip(self, bundle, recipients), fields(result_id = %bundle.meta.result_id, recipients = recipients.len()))]
    pub async fn send(
        &self,
        bundle: &ExportBundle,
        recipients: &[String],
        attach_exports: bool,
    ) -> DistributionRecord {
        let draft = post_draft(&self.subject_prefix, bundle, attach_exports);
        self.deliver(bundle.meta.result_id.to_string(), recipients, draft)
            .await
    }

    /// Deliver several posts, either one email per post or one combined
    /// email. Returns one record per email sent out.
    #[tracing::instrument(skip(self, bundles, recipients), fields(posts = bundles.len(), recipients = recipients.len()))]
    pub async fn send_many(
        &self,
        bundles: &[ExportBundle],
        recipients: &[String],
        mode: BatchMode,
        attach_exports: bool,
    ) -> Vec<DistributionRecord> {
        match mode {
            BatchMode::Separate => {
                let mut records = Vec::with_capacity(bundles.len());
                for (i, bundle) in bundles.iter().enumerate() {
                    let prefix = format!("Blog Post {}", i + 1);
                    let draft = post_draft(&prefix, bundle, attach_exports);
                    records.push(
                        self.deliver(bundle.meta.result_id.to_string(), recipients, draft)
                            .await,
                    );
                }
                records
            }
            BatchMode::Combined => {
                let result_ids = bundles
                    .iter()
                    .map(|b| b.meta.result_id.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                let draft = compose::combined_text_body(bundles).map(|body_text| Draft {
                    subject: compose::combined_subject(bundles.len()),
                    body_text,
                    body_html: None,
                    attachments: if attach_exports {
                        bundles.iter().flat_map(compose::export_attachments).collect()
                    } else {
                        Vec::new()
                    },
                });
                vec![self.deliver(result_ids, recipients, draft).await]
            }
        }
    }

    async fn deliver(
        &self,
        result_id: String,
        recipients: &[String],
        draft: Result<Draft, askama::Error>,
    ) -> DistributionRecord {
        let outcomes = unique_recipients(recipients)
            .into_iter()
            .map(RecipientOutcome::pending)
            .collect();
        let mut record = DistributionRecord::new(result_id, outcomes);

        for outcome in &mut record.recipients {
            if !is_valid_recipient(&outcome.address) {
                tracing::warn!(recipient = %outcome.address, "Skipping invalid recipient");
                outcome.mark_failed(DistributionError::InvalidRecipient(format!(
                    "'{}' is not a valid email address",
                    outcome.address
                )));
                continue;
            }

            let draft = match &draft {
                Ok(draft) => draft,
                Err(e) => {
                    outcome.mark_failed(DistributionError::SendFailed(format!(
                        "could not render email: {}",
                        e
                    )));
                    continue;
                }
            };

            let message = EmailMessage {
                to: outcome.address.clone(),
                subject: draft.subject.clone(),
                body_text: Some(draft.body_text.clone()),
                body_html: draft.body_html.clone(),
                attachments: draft.attachments.clone(),
            };

            match tokio::time::timeout(self.timeout, self.provider.send(&message)).await {
                Ok(Ok(provider_id)) => outcome.mark_sent(provider_id),
                Ok(Err(EmailError::InvalidRecipient(msg))) => {
                    outcome.mark_failed(DistributionError::InvalidRecipient(msg))
                }
                Ok(Err(e)) => outcome.mark_failed(DistributionError::SendFailed(e.to_string())),
                Err(_) => outcome.mark_failed(DistributionError::SendFailed(format!(
                    "no answer from mail server within {}s",
                    self.timeout.as_secs()
                ))),
            }

            if let Some(error) = &outcome.error {
                tracing::error!(recipient = %outcome.address, error = %error, "Failed to send email");
            }
        }

        record.resolve();

        for outcome in &record.recipients {
            metrics::record_email(&outcome.status.to_string());
        }
        tracing::info!(
            distribution_id = %record.distribution_id,
            status = %record.status,
            sent = record.summary.emails_sent,
            failed = record.summary.emails_failed,
            "Distribution finished"
        );

        record
    }
}

fn post_draft(
    prefix: &str,
    bundle: &ExportBundle,
    attach_exports: bool,
) -> Result<Draft, askama::Error> {
    Ok(Draft {
        subject: compose::subject(prefix, bundle),
        body_text: compose::text_body(bundle)?,
        body_html: Some(compose::html_body(bundle)?),
        attachments: if attach_exports {
            compose::export_attachments(bundle)
        } else {
            Vec::new()
        },
    })
}
