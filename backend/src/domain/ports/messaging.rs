//! Driving port for direct messages.

use async_trait::async_trait;

use crate::domain::{ComplaintId, Error, Message, UserId};

/// Outgoing message as submitted by the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub receiver: UserId,
    pub complaint_id: Option<ComplaintId>,
    pub content: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Messaging: Send + Sync {
    /// Deliver a message and notify the receiver.
    async fn send(&self, sender: &UserId, request: SendMessageRequest) -> Result<Message, Error>;

    /// Conversation between the session user and `other`, oldest first.
    async fn conversation(&self, user_id: &UserId, other: &UserId) -> Result<Vec<Message>, Error>;

    /// Mark messages received from `other` as read.
    async fn mark_read(&self, user_id: &UserId, other: &UserId) -> Result<u64, Error>;
}
