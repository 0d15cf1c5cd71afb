//! RecordingNotifier - keeps every delivered message; used by tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::message::{Message, Recipient};
use crate::ports::{NotifyError, Notifier};

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(Recipient, Message)>>,
    failing: Mutex<HashSet<Recipient>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every delivery to `recipient` fail with a transport error.
    pub fn fail_for(&self, recipient: Recipient) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(recipient);
    }

    pub fn sent(&self) -> Vec<(Recipient, Message)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn sent_to(&self, recipient: &Recipient) -> Vec<Message> {
        self.sent()
            .into_iter()
            .filter(|(r, _)| r == recipient)
            .map(|(_, m)| m)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: &Recipient, message: &Message) -> Result<(), NotifyError> {
        if self
            .failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(recipient)
        {
            return Err(NotifyError::Transport {
                recipient: recipient.clone(),
                reason: "simulated failure".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((recipient.clone(), message.clone()));
        Ok(())
    }
}
