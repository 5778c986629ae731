//! Recipient notification mails.
//!
//! [`Mailer`] is the seam between the upload flow and delivery:
//! [`SmtpMailer`] sends over SMTP, [`MemoryMailer`] records for tests.

mod memory;
mod smtp;

pub use memory::MemoryMailer;
pub use smtp::SmtpMailer;

use async_trait::async_trait;

use crate::html::escape;
use crate::Result;

/// File bytes carried by a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Filename shown to the recipient.
    pub filename: String,
    /// MIME type.
    pub content_type: String,
    /// Raw bytes.
    pub content: Vec<u8>,
}

/// "A file was shared with you" message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Id of the shared file.
    pub file_id: i64,
    /// Original filename.
    pub doc_name: String,
    /// Name of the sender.
    pub sender_name: String,
    /// Email of the sender (used as Reply-To).
    pub sender_email: String,
    /// Name of the recipient.
    pub recipient_name: String,
    /// Email of the recipient.
    pub recipient_email: String,
    /// Password of a freshly provisioned recipient account.
    pub one_time_password: Option<String>,
    /// Public URL of the portal.
    pub portal_url: String,
    /// File bytes; the mailer may drop them per server config.
    pub attachment: Option<Attachment>,
}

impl Notification {
    /// Mail subject line.
    pub fn subject(&self) -> String {
        format!("{} has sent you an attachment!", self.sender_name)
    }

    /// Link to the file page.
    pub fn file_url(&self) -> String {
        format!(
            "{}/files/view/{}",
            self.portal_url.trim_end_matches('/'),
            self.file_id
        )
    }

    /// HTML body.
    pub fn html_body(&self) -> String {
        let mut body = format!(
            "<p>Hi {recipient},</p>\n\
             <p>{sender} ({sender_email}) has shared <strong>{doc}</strong> with you.</p>\n\
             <p>You can view it at <a href=\"{url}\">{url}</a>.</p>\n",
            recipient = escape(&self.recipient_name),
            sender = escape(&self.sender_name),
            sender_email = escape(&self.sender_email),
            doc = escape(&self.doc_name),
            url = escape(&self.file_url()),
        );

        if let Some(ref password) = self.one_time_password {
            body.push_str(&format!(
                "<p>An account has been created for you. Log in with your email address \
                 and this password:</p>\n<p><code>{}</code></p>\n",
                escape(password)
            ));
        }

        body
    }
}

/// Delivers notifications.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one notification. Failures are returned, never retried.
    async fn send(&self, notification: &Notification) -> Result<()>;
}

#[cfg(test)]
pub(crate) fn sample_notification() -> Notification {
    Notification {
        file_id: 7,
        doc_name: "Q3 <report>.pdf".to_string(),
        sender_name: "Cheryl Smith".to_string(),
        sender_email: "cheryl@example.com".to_string(),
        recipient_name: "Foo".to_string(),
        recipient_email: "foo@bar.com".to_string(),
        one_time_password: Some("aB3dE6gH9jK2mN5".to_string()),
        portal_url: "https://files.example.com/".to_string(),
        attachment: Some(Attachment {
            filename: "Q3 <report>.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            content: b"%PDF-1.4".to_vec(),
        }),
    }
}
