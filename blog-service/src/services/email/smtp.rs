use super::{EmailError, EmailMessage, EmailProvider};
use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// SMTP delivery over STARTTLS.
pub struct SmtpProvider {
    config: SmtpConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpProvider {
    pub fn new(config: SmtpConfig) -> Result<Self, EmailError> {
        if !config.enabled {
            return Ok(Self {
                config,
                transport: None,
            });
        }

        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| EmailError::Configuration(format!("Failed to create SMTP relay: {}", e)))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            config,
            transport: Some(transport),
        })
    }

    fn build_message(&self, email: &EmailMessage) -> Result<Message, EmailError> {
        let from_mailbox: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| EmailError::Configuration(format!("Invalid from address: {}", e)))?;

        let to_mailbox: Mailbox = email
            .to
            .parse()
            .map_err(|e| EmailError::InvalidRecipient(format!("{}: {}", email.to, e)))?;

        let builder = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(&email.subject);

        let body = match (&email.body_text, &email.body_html) {
            (Some(text), Some(html)) => {
                Body::Alternative(MultiPart::alternative_plain_html(text.clone(), html.clone()))
            }
            (Some(text), None) => Body::Single(SinglePart::plain(text.clone())),
            (None, Some(html)) => Body::Single(SinglePart::html(html.clone())),
            (None, None) => {
                return Err(EmailError::SendFailed(
                    "Email must have either text or HTML body".to_string(),
                ));
            }
        };

        let built = if email.attachments.is_empty() {
            match body {
                Body::Single(part) => builder.singlepart(part),
                Body::Alternative(parts) => builder.multipart(parts),
            }
        } else {
            let mut mixed = match body {
                Body::Single(part) => MultiPart::mixed().singlepart(part),
                Body::Alternative(parts) => MultiPart::mixed().multipart(parts),
            };
            for attachment in &email.attachments {
                let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
                    EmailError::SendFailed(format!(
                        "Invalid content type for {}: {}",
                        attachment.file_name, e
                    ))
                })?;
                mixed = mixed.singlepart(
                    Attachment::new(attachment.file_name.clone())
                        .body(attachment.content.clone(), content_type),
                );
            }
            builder.multipart(mixed)
        };

        built.map_err(|e| EmailError::SendFailed(format!("Failed to build message: {}", e)))
    }
}

enum Body {
    Single(SinglePart),
    Alternative(MultiPart),
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    async fn send(&self, email: &EmailMessage) -> Result<Option<String>, EmailError> {
        let transport = self.transport.as_ref().ok_or_else(|| {
            EmailError::NotEnabled("SMTP email provider is not enabled".to_string())
        })?;

        let message = self.build_message(email)?;

        let response = transport
            .send(message)
            .await
            .map_err(|e| EmailError::SendFailed(format!("Failed to send email: {}", e)))?;

        tracing::info!(to = %email.to, subject = %email.subject, "Email sent successfully");

        let message_id = response.message().next().map(str::to_string);
        Ok(message_id)
    }

    async fn health_check(&self) -> Result<(), EmailError> {
        let Some(transport) = self.transport.as_ref() else {
            return Ok(());
        };

        let reachable = transport
            .test_connection()
            .await
            .map_err(|e| EmailError::Connection(format!("SMTP connection test failed: {}", e)))?;

        if reachable {
            Ok(())
        } else {
            Err(EmailError::Connection(format!(
                "SMTP server {}:{} did not accept the connection",
                self.config.host, self.config.port
            )))
        }
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::email::EmailAttachment;

    fn config(enabled: bool) -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            user: "agent".to_string(),
            password: "secret".to_string(),
            from_email: "agent@example.com".to_string(),
            from_name: "LinkedIn Blog Agent".to_string(),
            enabled,
        }
    }

    fn message(to: &str) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject: "Generated LinkedIn Blog Post: Hello".to_string(),
            body_text: Some("hello".to_string()),
            body_html: Some("<p>hello</p>".to_string()),
            attachments: Vec::new(),
        }
    }

    #[tokio::test]
    async fn disabled_provider_refuses_to_send() {
        let provider = SmtpProvider::new(config(false)).unwrap();

        assert!(!provider.is_enabled());
        assert!(matches!(
            provider.send(&message("a@x.com")).await,
            Err(EmailError::NotEnabled(_))
        ));
        assert!(provider.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn builds_multipart_message() {
        let provider = SmtpProvider::new(config(true)).unwrap();
        let built = provider.build_message(&message("a@x.com")).unwrap();
        let raw = String::from_utf8(built.formatted()).unwrap();

        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("Subject: Generated LinkedIn Blog Post: Hello"));
    }

    #[tokio::test]
    async fn attachments_wrap_the_body_in_a_mixed_part() {
        let provider = SmtpProvider::new(config(true)).unwrap();
        let mut email = message("a@x.com");
        email.attachments.push(EmailAttachment {
            file_name: "linkedin_post_20250101_120000.json".to_string(),
            content_type: "application/json".to_string(),
            content: br#"{"text":"hello"}"#.to_vec(),
        });

        let built = provider.build_message(&email).unwrap();
        let raw = String::from_utf8(built.formatted()).unwrap();

        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("filename=\"linkedin_post_20250101_120000.json\""));
    }

    #[tokio::test]
    async fn unparseable_recipient_is_rejected() {
        let provider = SmtpProvider::new(config(true)).unwrap();

        assert!(matches!(
            provider.build_message(&message("not-an-email")),
            Err(EmailError::InvalidRecipient(_))
        ));
    }
}
