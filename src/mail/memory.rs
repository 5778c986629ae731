//! In-process mailer that records notifications.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Mailer, Notification};
use crate::{FileshareError, Result};

/// Mailer that keeps every notification in memory.
///
/// Used by tests and by deployments without a relay; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<Notification>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryMailer {
    /// Create an empty mailer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Notifications delivered so far.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, notification: &Notification) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(FileshareError::Mail("relay unavailable".to_string()));
        }
        self.sent
            .lock()
            .map_err(|_| FileshareError::Mail("mailbox poisoned".to_string()))?
            .push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::sample_notification;

    #[tokio::test]
    async fn test_records_notifications() {
        let mailer = MemoryMailer::new();
        let shared = mailer.clone();

        mailer.send(&sample_notification()).await.unwrap();

        assert_eq!(shared.sent().len(), 1);
        assert_eq!(shared.sent()[0].recipient_email, "foo@bar.com");
    }

    #[tokio::test]
    async fn test_failing_mode() {
        let mailer = MemoryMailer::new();
        mailer.set_failing(true);

        assert!(matches!(
            mailer.send(&sample_notification()).await,
            Err(FileshareError::Mail(_))
        ));
        assert!(mailer.sent().is_empty());

        mailer.set_failing(false);
        assert!(mailer.send(&sample_notification()).await.is_ok());
    }
}
