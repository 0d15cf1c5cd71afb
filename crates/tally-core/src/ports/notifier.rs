//! Notifier port - message delivery to one recipient at a time.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::errors::{Classify, ErrorKind};
use crate::domain::message::{Message, Recipient};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("delivery to {recipient} failed: {reason}")]
    Transport { recipient: Recipient, reason: String },

    #[error("recipient {0} rejected the message")]
    Rejected(Recipient),
}

impl Classify for NotifyError {
    fn kind(&self) -> ErrorKind {
        match self {
            NotifyError::Transport { .. } => ErrorKind::Transient,
            NotifyError::Rejected(_) => ErrorKind::Permanent,
        }
    }
}

/// Delivers messages. Each call is independent: a failure for one recipient
/// says nothing about the others, and callers keep going through the batch.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &Recipient, message: &Message) -> Result<(), NotifyError>;
}
