use crate::error::{EmailError, EmailResult};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Outbound mail seam used by the account directory
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an HTML message, returning the provider's message id
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> EmailResult<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub message_id: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Records messages instead of delivering them
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    outbox: Arc<Mutex<Vec<SentEmail>>>,
    failing: bool,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send fails with [`EmailError::SendFailed`]
    pub fn failing() -> Self {
        Self {
            outbox: Arc::default(),
            failing: true,
        }
    }

    pub async fn sent(&self) -> Vec<SentEmail> {
        self.outbox.lock().await.clone()
    }

    pub async fn last_sent_to(&self, to: &str) -> Option<SentEmail> {
        self.outbox
            .lock()
            .await
            .iter()
            .rev()
            .find(|email| email.to == to)
            .cloned()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> EmailResult<String> {
        if self.failing {
            return Err(EmailError::SendFailed("outbound mail unavailable".into()));
        }

        let message_id = Uuid::new_v4().to_string();
        self.outbox.lock().await.push(SentEmail {
            message_id: message_id.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        });
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_notifier_records_messages() {
        let notifier = InMemoryNotifier::new();
        notifier.send("a@example.com", "Hi", "<p>one</p>").await.unwrap();
        notifier.send("a@example.com", "Hi again", "<p>two</p>").await.unwrap();

        assert_eq!(notifier.sent().await.len(), 2);
        let last = notifier.last_sent_to("a@example.com").await.unwrap();
        assert_eq!(last.subject, "Hi again");
        assert!(notifier.last_sent_to("b@example.com").await.is_none());
    }

    #[tokio::test]
    async fn test_failing_notifier_records_nothing() {
        let notifier = InMemoryNotifier::failing();
        let result = notifier.send("a@example.com", "Hi", "<p>x</p>").await;

        assert!(matches!(result, Err(EmailError::SendFailed(_))));
        assert!(notifier.sent().await.is_empty());
    }
}
