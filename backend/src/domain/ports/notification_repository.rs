//! Port for notification persistence.

use async_trait::async_trait;

use crate::domain::{Notification, NotificationId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification repository adapters.
    pub enum NotificationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "notification repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "notification repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert a notification.
    async fn insert(&self, notification: &Notification) -> Result<(), NotificationRepositoryError>;

    /// Notifications for `recipient`, newest first.
    async fn list_for(
        &self,
        recipient: &UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationRepositoryError>;

    async fn find_by_id(
        &self,
        id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationRepositoryError>;

    /// Set the read flag. Already-read notifications are left as they are.
    async fn mark_read(&self, id: &NotificationId) -> Result<(), NotificationRepositoryError>;

    /// Mark every unread notification for `recipient` as read, returning how
    /// many changed.
    async fn mark_all_read(&self, recipient: &UserId) -> Result<u64, NotificationRepositoryError>;
}
