//! LogNotifier - "delivers" messages by logging them.

use async_trait::async_trait;

use crate::domain::message::{Message, Recipient};
use crate::ports::{NotifyError, Notifier};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipient: &Recipient, message: &Message) -> Result<(), NotifyError> {
        tracing::info!(
            recipient = %recipient,
            poll_id = %message.poll_id(),
            text = %message.text(),
            "message delivered"
        );
        Ok(())
    }
}
