//! Port for direct message persistence.

use async_trait::async_trait;

use crate::domain::{Message, Notification, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by message repository adapters.
    pub enum MessageRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "message repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "message repository query failed: {message}",
        /// The receiver or the linked complaint no longer exists.
        MissingReference { message: String } =>
            "message references a missing record: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Insert `message` and the receiver's `notification` in one transaction.
    async fn send(
        &self,
        message: &Message,
        notification: &Notification,
    ) -> Result<(), MessageRepositoryError>;

    /// Messages exchanged between two users, oldest first.
    async fn conversation(
        &self,
        first: &UserId,
        second: &UserId,
    ) -> Result<Vec<Message>, MessageRepositoryError>;

    /// Mark messages from `sender` to `reader` as read, returning how many
    /// changed.
    async fn mark_conversation_read(
        &self,
        reader: &UserId,
        sender: &UserId,
    ) -> Result<u64, MessageRepositoryError>;
}
