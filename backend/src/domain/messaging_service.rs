//! Direct messaging between users.
//!
//! Each delivered message is paired with a `new_message` notification for the
//! receiver; the repository stores both in one transaction.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;

use crate::domain::ports::{
    MessageRepository, MessageRepositoryError, Messaging, SendMessageRequest, UserRepository,
};
use crate::domain::user_account_service::{load_session_user, map_user_error};
use crate::domain::{
    Error, Message, MessageDraft, MessageId, MessageValidationError, Notification,
    NotificationId, Retrier, UserId,
};

fn map_message_error(error: MessageRepositoryError) -> Error {
    match error {
        MessageRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("message repository unavailable: {message}"))
        }
        MessageRepositoryError::Query { message } => {
            Error::internal(format!("message repository error: {message}"))
        }
        MessageRepositoryError::MissingReference { message } => Error::not_found(message),
    }
}

fn map_validation_error(error: MessageValidationError) -> Error {
    let field = match error {
        MessageValidationError::SelfAddressed => "receiverId",
        MessageValidationError::EmptyContent | MessageValidationError::ContentTooLong { .. } => {
            "content"
        }
    };
    Error::invalid_request(error.to_string()).with_details(json!({ "field": field }))
}

/// Messaging service implementing [`Messaging`].
#[derive(Clone)]
pub struct MessagingService<M, U> {
    messages: Arc<M>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
    retrier: Retrier,
}

impl<M, U> MessagingService<M, U> {
    pub fn new(messages: Arc<M>, users: Arc<U>, clock: Arc<dyn Clock>, retrier: Retrier) -> Self {
        Self {
            messages,
            users,
            clock,
            retrier,
        }
    }
}

#[async_trait]
impl<M, U> Messaging for MessagingService<M, U>
where
    M: MessageRepository,
    U: UserRepository,
{
    async fn send(&self, sender: &UserId, request: SendMessageRequest) -> Result<Message, Error> {
        let SendMessageRequest {
            receiver,
            complaint_id,
            content,
        } = request;
        let draft = MessageDraft::try_new(*sender, receiver, complaint_id, content)
            .map_err(map_validation_error)?;
        let author = load_session_user(self.users.as_ref(), &self.retrier, sender).await?;

        let users = self.users.as_ref();
        let receiver = &receiver;
        let receiver_exists = self
            .retrier
            .run("users.find_by_id", || async move {
                users.find_by_id(receiver).await.map_err(map_user_error)
            })
            .await?
            .is_some();
        if !receiver_exists {
            return Err(Error::not_found(format!("user {receiver} not found")));
        }

        let now = self.clock.utc();
        let notification = Notification::from_draft(
            NotificationId::random(),
            draft.notification(author.name().as_ref()),
            now,
        );
        let message = Message::from_draft(MessageId::random(), draft, now);

        let messages = self.messages.as_ref();
        let (outgoing, note) = (&message, &notification);
        self.retrier
            .run("messages.send", || async move {
                messages
                    .send(outgoing, note)
                    .await
                    .map_err(map_message_error)
            })
            .await?;
        Ok(message)
    }

    async fn conversation(&self, user_id: &UserId, other: &UserId) -> Result<Vec<Message>, Error> {
        let messages = self.messages.as_ref();
        self.retrier
            .run("messages.conversation", || async move {
                messages
                    .conversation(user_id, other)
                    .await
                    .map_err(map_message_error)
            })
            .await
    }

    async fn mark_read(&self, user_id: &UserId, other: &UserId) -> Result<u64, Error> {
        let messages = self.messages.as_ref();
        self.retrier
            .run("messages.mark_conversation_read", || async move {
                messages
                    .mark_conversation_read(user_id, other)
                    .await
                    .map_err(map_message_error)
            })
            .await
    }
}

#[cfg(test)]
#[path = "messaging_service_tests.rs"]
mod tests;
