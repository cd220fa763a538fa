use super::{EmailError, EmailMessage, EmailProvider};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Mock email provider for local runs and tests.
pub struct MockEmailProvider {
    enabled: bool,
    send_count: AtomicU64,
    failing: HashSet<String>,
    delay: Option<Duration>,
    sent: Mutex<Vec<EmailMessage>>,
}

impl MockEmailProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            send_count: AtomicU64::new(0),
            failing: HashSet::new(),
            delay: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Sends to any of `addresses` fail with `SendFailed`.
    pub fn failing_for<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing = addresses.into_iter().map(Into::into).collect();
        self
    }

    /// Every send sleeps this long first.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }

    /// Messages accepted so far.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    async fn send(&self, email: &EmailMessage) -> Result<Option<String>, EmailError> {
        if !self.enabled {
            return Err(EmailError::NotEnabled(
                "Mock email provider is not enabled".to_string(),
            ));
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(&email.to) {
            return Err(EmailError::SendFailed(format!(
                "Mock mailbox {} rejected the message",
                email.to
            )));
        }

        let count = self.send_count.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email.clone());
        }

        tracing::info!(to = %email.to, subject = %email.subject, "[MOCK] Email would be sent");

        Ok(Some(format!("mock-email-{}", count)))
    }

    async fn health_check(&self) -> Result<(), EmailError> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
