//! JSON response bodies shared by the REST handlers.
//!
//! Field names are camelCase on the wire. Password digests never appear here.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    Complaint, ComplaintStatus, Message, Notification, NotificationKind, Role, TechnicalMember,
    User,
};

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@campus.test")]
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub points: u32,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: *user.id().as_uuid(),
            name: user.name().to_string(),
            email: user.email().to_string(),
            role: user.role(),
            department: user.department().map(ToString::to_string),
            points: user.points(),
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[schema(example = "plumbing")]
    pub category: String,
    pub location: Option<String>,
    #[schema(example = "medium")]
    pub difficulty: String,
    /// Points the volunteer earns on resolution.
    pub points: u32,
    pub emergency: bool,
    pub status: ComplaintStatus,
    pub raised_by: Uuid,
    pub volunteer_id: Option<Uuid>,
    pub volunteer_name: Option<String>,
    #[schema(value_type = String, format = Date, example = "2026-02-01")]
    pub fix_till_date: NaiveDate,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<Complaint> for ComplaintResponse {
    fn from(complaint: Complaint) -> Self {
        Self {
            id: *complaint.id().as_uuid(),
            title: complaint.title().to_owned(),
            description: complaint.description().to_owned(),
            category: complaint.category().to_string(),
            location: complaint.location().map(str::to_owned),
            difficulty: complaint.difficulty().as_str().to_owned(),
            points: complaint.difficulty().points(),
            emergency: complaint.is_emergency(),
            status: complaint.status(),
            raised_by: *complaint.raised_by().as_uuid(),
            volunteer_id: complaint.volunteer_id().map(|id| *id.as_uuid()),
            volunteer_name: complaint.volunteer().map(|v| v.name.clone()),
            fix_till_date: complaint.fix_till_date(),
            created_at: complaint.created_at(),
            resolved_at: complaint.resolved_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub complaint_id: Option<Uuid>,
    pub read: bool,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        Self {
            id: *notification.id.as_uuid(),
            user_id: *notification.recipient.as_uuid(),
            kind: notification.kind,
            message: notification.message,
            complaint_id: notification.complaint_id.map(|id| *id.as_uuid()),
            read: notification.read,
            created_at: notification.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub complaint_id: Option<Uuid>,
    pub content: String,
    pub read: bool,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: *message.id.as_uuid(),
            sender_id: *message.sender.as_uuid(),
            receiver_id: *message.receiver.as_uuid(),
            complaint_id: message.complaint_id.map(|id| *id.as_uuid()),
            content: message.content,
            read: message.read,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalMemberResponse {
    pub user_id: Uuid,
    pub name: String,
    pub department: String,
    pub available: bool,
}

impl From<TechnicalMember> for TechnicalMemberResponse {
    fn from(member: TechnicalMember) -> Self {
        Self {
            user_id: *member.user_id.as_uuid(),
            name: member.name.to_string(),
            department: member.department.to_string(),
            available: member.available,
        }
    }
}

/// Count of rows a bulk acknowledgement changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpdatedCount {
    pub updated: u64,
}

/// Distinguish an absent field from an explicit `null`.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`.
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
