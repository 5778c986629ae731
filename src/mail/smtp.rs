//! SMTP delivery over implicit TLS.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use super::{Mailer, Notification};
use crate::db::{Database, ServerConfig, ServerConfigRepository};
use crate::{FileshareError, Result};

/// Mailer reading its relay settings from the `server_config` row.
#[derive(Clone)]
pub struct SmtpMailer {
    db: Database,
}

impl SmtpMailer {
    /// Create a mailer backed by the given database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn mailbox(name: &str, email: &str) -> Result<Mailbox> {
    let address = email
        .parse::<Address>()
        .map_err(|e| FileshareError::Mail(format!("invalid address {email}: {e}")))?;
    let name = Some(name.to_string()).filter(|n| !n.is_empty());
    Ok(Mailbox::new(name, address))
}

/// Compose the MIME message for a notification.
pub(crate) fn build_message(config: &ServerConfig, notification: &Notification) -> Result<Message> {
    let html = SinglePart::html(notification.html_body());

    let body = match notification.attachment {
        Some(ref attachment) if config.attach_files => {
            let content_type = ContentType::parse(&attachment.content_type)
                .or_else(|_| ContentType::parse("application/octet-stream"))
                .map_err(|e| FileshareError::Mail(e.to_string()))?;
            MultiPart::mixed().singlepart(html).singlepart(
                MimeAttachment::new(attachment.filename.clone())
                    .body(attachment.content.clone(), content_type),
            )
        }
        _ => MultiPart::mixed().singlepart(html),
    };

    Message::builder()
        .from(mailbox(&notification.sender_name, &config.from_address)?)
        .reply_to(mailbox(
            &notification.sender_name,
            &notification.sender_email,
        )?)
        .to(mailbox(
            &notification.recipient_name,
            &notification.recipient_email,
        )?)
        .subject(notification.subject())
        .multipart(body)
        .map_err(|e| FileshareError::Mail(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let config = match ServerConfigRepository::new(self.db.pool()).get().await {
            Ok(config) => config,
            Err(FileshareError::NotFound(_)) => {
                return Err(FileshareError::Mail(
                    "mail server is not configured".to_string(),
                ))
            }
            Err(e) => return Err(e),
        };

        let message = build_message(&config, notification)?;
        let port = u16::try_from(config.mail_port)
            .map_err(|_| FileshareError::Mail(format!("invalid port {}", config.mail_port)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.mail_server)
            .map_err(|e| FileshareError::Mail(e.to_string()))?
            .port(port)
            .credentials(Credentials::new(
                config.mail_username.clone(),
                config.mail_password.clone(),
            ))
            .build();

        transport
            .send(message)
            .await
            .map_err(|e| FileshareError::Mail(e.to_string()))?;

        info!(
            "Notified {} about file {}",
            notification.recipient_email, notification.file_id
        );
        Ok(())
    }
}
