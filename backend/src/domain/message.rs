//! Direct messages between users.
//!
//! Conversations are read by polling; each delivered message raises one
//! `new_message` notification for the receiver.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ComplaintId, NotificationDraft, NotificationKind, UserId};

/// Maximum message length in characters.
pub const MESSAGE_CONTENT_MAX: usize = 2000;

/// Stable message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

/// Validation failures for outgoing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageValidationError {
    EmptyContent,
    ContentTooLong { max: usize },
    SelfAddressed,
}

impl fmt::Display for MessageValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "message content must not be empty"),
            Self::ContentTooLong { max } => {
                write!(f, "message content must be at most {max} characters")
            }
            Self::SelfAddressed => write!(f, "cannot send a message to yourself"),
        }
    }
}

impl std::error::Error for MessageValidationError {}

/// A message about to be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    sender: UserId,
    receiver: UserId,
    complaint_id: Option<ComplaintId>,
    content: String,
}

impl MessageDraft {
    /// Validate an outgoing message. Content keeps interior whitespace but
    /// must contain something other than whitespace.
    pub fn try_new(
        sender: UserId,
        receiver: UserId,
        complaint_id: Option<ComplaintId>,
        content: impl Into<String>,
    ) -> Result<Self, MessageValidationError> {
        let content = content.into();
        if sender == receiver {
            return Err(MessageValidationError::SelfAddressed);
        }
        if content.trim().is_empty() {
            return Err(MessageValidationError::EmptyContent);
        }
        if content.chars().count() > MESSAGE_CONTENT_MAX {
            return Err(MessageValidationError::ContentTooLong {
                max: MESSAGE_CONTENT_MAX,
            });
        }
        Ok(Self {
            sender,
            receiver,
            complaint_id,
            content,
        })
    }

    pub fn sender(&self) -> &UserId {
        &self.sender
    }

    pub fn receiver(&self) -> &UserId {
        &self.receiver
    }

    pub fn complaint_id(&self) -> Option<ComplaintId> {
        self.complaint_id
    }

    pub fn content(&self) -> &str {
        self.content.as_str()
    }

    /// Notification delivered to the receiver alongside the message.
    pub fn notification(&self, sender_name: &str) -> NotificationDraft {
        NotificationDraft::generated(
            self.receiver,
            NotificationKind::NewMessage,
            format!("New message from {sender_name}"),
            self.complaint_id,
        )
    }
}

/// Stored message read model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub sender: UserId,
    pub receiver: UserId,
    pub complaint_id: Option<ComplaintId>,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Materialise a draft as an unread message.
    pub fn from_draft(id: MessageId, draft: MessageDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            sender: draft.sender,
            receiver: draft.receiver,
            complaint_id: draft.complaint_id,
            content: draft.content,
            read: false,
            created_at,
        }
    }

    /// Whether this message belongs to the conversation between `a` and `b`.
    pub fn is_between(&self, a: &UserId, b: &UserId) -> bool {
        (self.sender == *a && self.receiver == *b) || (self.sender == *b && self.receiver == *a)
    }
}
