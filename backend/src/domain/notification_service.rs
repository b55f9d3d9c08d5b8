//! Notification inbox service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{
    NotificationInbox, NotificationRepository, NotificationRepositoryError, UserRepository,
};
use crate::domain::user_account_service::{load_session_user, map_user_error};
use crate::domain::{
    Error, Notification, NotificationDraft, NotificationId, Retrier, Role, UserId,
};

fn map_notification_error(error: NotificationRepositoryError) -> Error {
    match error {
        NotificationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("notification repository unavailable: {message}"))
        }
        NotificationRepositoryError::Query { message } => {
            Error::internal(format!("notification repository error: {message}"))
        }
    }
}

/// Inbox service implementing [`NotificationInbox`].
#[derive(Clone)]
pub struct NotificationService<N, U> {
    notifications: Arc<N>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
    retrier: Retrier,
}

impl<N, U> NotificationService<N, U> {
    pub fn new(
        notifications: Arc<N>,
        users: Arc<U>,
        clock: Arc<dyn Clock>,
        retrier: Retrier,
    ) -> Self {
        Self {
            notifications,
            users,
            clock,
            retrier,
        }
    }
}

#[async_trait]
impl<N, U> NotificationInbox for NotificationService<N, U>
where
    N: NotificationRepository,
    U: UserRepository,
{
    async fn list(&self, user_id: &UserId, unread_only: bool) -> Result<Vec<Notification>, Error> {
        let notifications = self.notifications.as_ref();
        self.retrier
            .run("notifications.list_for", || async move {
                notifications
                    .list_for(user_id, unread_only)
                    .await
                    .map_err(map_notification_error)
            })
            .await
    }

    async fn mark_read(
        &self,
        user_id: &UserId,
        notification_id: &NotificationId,
    ) -> Result<Notification, Error> {
        let notifications = self.notifications.as_ref();
        let mut notification = self
            .retrier
            .run("notifications.find_by_id", || async move {
                notifications
                    .find_by_id(notification_id)
                    .await
                    .map_err(map_notification_error)
            })
            .await?
            .ok_or_else(|| Error::not_found(format!("notification {notification_id} not found")))?;
        if &notification.recipient != user_id {
            return Err(Error::forbidden(
                "only the recipient may mark a notification read",
            ));
        }
        if notification.read {
            return Ok(notification);
        }

        self.retrier
            .run("notifications.mark_read", || async move {
                notifications
                    .mark_read(notification_id)
                    .await
                    .map_err(map_notification_error)
            })
            .await?;
        notification.read = true;
        Ok(notification)
    }

    async fn mark_all_read(&self, user_id: &UserId) -> Result<u64, Error> {
        let notifications = self.notifications.as_ref();
        self.retrier
            .run("notifications.mark_all_read", || async move {
                notifications
                    .mark_all_read(user_id)
                    .await
                    .map_err(map_notification_error)
            })
            .await
    }

    async fn send(&self, actor: &UserId, draft: NotificationDraft) -> Result<Notification, Error> {
        let sender = load_session_user(self.users.as_ref(), &self.retrier, actor).await?;
        if sender.role() != Role::Admin {
            return Err(Error::forbidden("only administrators may send notifications"));
        }

        let users = self.users.as_ref();
        let recipient = draft.recipient();
        let exists = self
            .retrier
            .run("users.find_by_id", || async move {
                users.find_by_id(recipient).await.map_err(map_user_error)
            })
            .await?
            .is_some();
        if !exists {
            return Err(Error::not_found(format!("user {recipient} not found")));
        }

        let notification = Notification::from_draft(NotificationId::random(), draft, self.clock.utc());
        let notifications = self.notifications.as_ref();
        let candidate = &notification;
        self.retrier
            .run("notifications.insert", || async move {
                notifications
                    .insert(candidate)
                    .await
                    .map_err(map_notification_error)
            })
            .await?;
        Ok(notification)
    }
}

#[cfg(test)]
#[path = "notification_service_tests.rs"]
mod tests;
