//! Email transport abstraction used by the distribution dispatcher.

pub mod compose;
pub mod mock;
pub mod smtp;

use async_trait::async_trait;
use thiserror::Error;

pub use mock::MockEmailProvider;
pub use smtp::SmtpProvider;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Provider not enabled: {0}")]
    NotEnabled(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Send error: {0}")]
    SendFailed(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAttachment {
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
    pub attachments: Vec<EmailAttachment>,
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Deliver one message; returns the transport's message id when it has one.
    async fn send(&self, email: &EmailMessage) -> Result<Option<String>, EmailError>;
    async fn health_check(&self) -> Result<(), EmailError>;
    fn is_enabled(&self) -> bool;
}
