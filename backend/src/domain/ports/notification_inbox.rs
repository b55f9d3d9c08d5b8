//! Driving port for reading and acknowledging notifications.

use async_trait::async_trait;

use crate::domain::{Error, Notification, NotificationDraft, NotificationId, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationInbox: Send + Sync {
    /// The session user's notifications, newest first.
    async fn list(&self, user_id: &UserId, unread_only: bool) -> Result<Vec<Notification>, Error>;

    /// Mark one notification read. Only its recipient may do so.
    async fn mark_read(
        &self,
        user_id: &UserId,
        notification_id: &NotificationId,
    ) -> Result<Notification, Error>;

    /// Mark all of the session user's notifications read.
    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, Error>;

    /// Administrator notice to a single user.
    async fn send(&self, actor: &UserId, draft: NotificationDraft) -> Result<Notification, Error>;
}
