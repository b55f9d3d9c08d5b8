//! Notifications: one-way, read-once messages generated by lifecycle and
//! messaging events.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ComplaintId, UserId};

/// Maximum notification text length in characters.
pub const NOTIFICATION_MESSAGE_MAX: usize = 500;

/// Stable notification identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
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

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Event that produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ComplaintResolved,
    NewMessage,
    ComplaintAccepted,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ComplaintResolved => "complaint_resolved",
            Self::NewMessage => "new_message",
            Self::ComplaintAccepted => "complaint_accepted",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = NotificationValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "complaint_resolved" => Ok(Self::ComplaintResolved),
            "new_message" => Ok(Self::NewMessage),
            "complaint_accepted" => Ok(Self::ComplaintAccepted),
            other => Err(NotificationValidationError::UnknownKind(other.to_owned())),
        }
    }
}

/// Validation failures for notification values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationValidationError {
    EmptyMessage,
    MessageTooLong { max: usize },
    UnknownKind(String),
}

impl fmt::Display for NotificationValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "notification message must not be empty"),
            Self::MessageTooLong { max } => {
                write!(f, "notification message must be at most {max} characters")
            }
            Self::UnknownKind(kind) => write!(f, "unknown notification type: {kind}"),
        }
    }
}

impl std::error::Error for NotificationValidationError {}

/// A notification waiting to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    recipient: UserId,
    kind: NotificationKind,
    message: String,
    complaint_id: Option<ComplaintId>,
}

impl NotificationDraft {
    /// Validate the message text; it is trimmed and must be non-empty.
    pub fn try_new(
        recipient: UserId,
        kind: NotificationKind,
        message: impl AsRef<str>,
        complaint_id: Option<ComplaintId>,
    ) -> Result<Self, NotificationValidationError> {
        let message = message.as_ref().trim();
        if message.is_empty() {
            return Err(NotificationValidationError::EmptyMessage);
        }
        if message.chars().count() > NOTIFICATION_MESSAGE_MAX {
            return Err(NotificationValidationError::MessageTooLong {
                max: NOTIFICATION_MESSAGE_MAX,
            });
        }
        Ok(Self {
            recipient,
            kind,
            message: message.to_owned(),
            complaint_id,
        })
    }

    /// Build a system-generated notification, shortening overlong text.
    pub(crate) fn generated(
        recipient: UserId,
        kind: NotificationKind,
        message: String,
        complaint_id: Option<ComplaintId>,
    ) -> Self {
        let message = if message.chars().count() > NOTIFICATION_MESSAGE_MAX {
            message.chars().take(NOTIFICATION_MESSAGE_MAX).collect()
        } else {
            message
        };
        Self {
            recipient,
            kind,
            message,
            complaint_id,
        }
    }

    pub fn recipient(&self) -> &UserId {
        &self.recipient
    }

    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    pub fn complaint_id(&self) -> Option<ComplaintId> {
        self.complaint_id
    }
}

/// Stored notification read model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: UserId,
    pub kind: NotificationKind,
    pub message: String,
    pub complaint_id: Option<ComplaintId>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Materialise a draft as an unread notification.
    pub fn from_draft(id: NotificationId, draft: NotificationDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            recipient: draft.recipient,
            kind: draft.kind,
            message: draft.message,
            complaint_id: draft.complaint_id,
            read: false,
            created_at,
        }
    }
}
