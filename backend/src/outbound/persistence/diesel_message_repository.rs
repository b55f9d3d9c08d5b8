//! PostgreSQL-backed `MessageRepository` implementation.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{MessageRepository, MessageRepositoryError};
use crate::domain::{ComplaintId, Message, MessageId, Notification, UserId};

use super::diesel_basic_error_mapping::{
    is_foreign_key_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::diesel_notification_repository::notification_row;
use super::models::MessageRow;
use super::pool::{DbPool, PoolError};
use super::schema::{messages, notifications};

/// Diesel-backed implementation of the message repository port.
#[derive(Clone)]
pub struct DieselMessageRepository {
    pool: DbPool,
}

impl DieselMessageRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> MessageRepositoryError {
    map_basic_pool_error(error, MessageRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> MessageRepositoryError {
    map_basic_diesel_error(
        error,
        MessageRepositoryError::query,
        MessageRepositoryError::connection,
    )
}

fn map_send_error(error: diesel::result::Error, message: &MessageRow) -> MessageRepositoryError {
    if is_foreign_key_violation(&error) {
        return MessageRepositoryError::missing_reference(match message.complaint_id {
            Some(complaint) => format!(
                "receiver {} or complaint {complaint} not found",
                message.receiver_id
            ),
            None => format!("receiver {} not found", message.receiver_id),
        });
    }
    map_diesel_error(error)
}

fn message_row(message: &Message) -> MessageRow {
    MessageRow {
        id: *message.id.as_uuid(),
        sender_id: *message.sender.as_uuid(),
        receiver_id: *message.receiver.as_uuid(),
        complaint_id: message.complaint_id.map(|id| *id.as_uuid()),
        content: message.content.clone(),
        read: message.read,
        created_at: message.created_at,
    }
}

fn row_to_message(row: MessageRow) -> Message {
    Message {
        id: MessageId::from_uuid(row.id),
        sender: UserId::from_uuid(row.sender_id),
        receiver: UserId::from_uuid(row.receiver_id),
        complaint_id: row.complaint_id.map(ComplaintId::from_uuid),
        content: row.content,
        read: row.read,
        created_at: row.created_at,
    }
}

#[async_trait]
impl MessageRepository for DieselMessageRepository {
    async fn send(
        &self,
        message: &Message,
        notification: &Notification,
    ) -> Result<(), MessageRepositoryError> {
        let message = message_row(message);
        let note = notification_row(notification);
        let (row, note_row) = (&message, &note);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                diesel::insert_into(messages::table)
                    .values(row)
                    .execute(conn)
                    .await?;
                diesel::insert_into(notifications::table)
                    .values(note_row)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| map_send_error(error, &message))
    }

    async fn conversation(
        &self,
        first: &UserId,
        second: &UserId,
    ) -> Result<Vec<Message>, MessageRepositoryError> {
        let (a, b) = (*first.as_uuid(), *second.as_uuid());
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<MessageRow> = messages::table
            .filter(
                messages::sender_id
                    .eq(a)
                    .and(messages::receiver_id.eq(b))
                    .or(messages::sender_id.eq(b).and(messages::receiver_id.eq(a))),
            )
            .order((messages::created_at.asc(), messages::id.asc()))
            .select(MessageRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_message).collect())
    }

    async fn mark_conversation_read(
        &self,
        reader: &UserId,
        sender: &UserId,
    ) -> Result<u64, MessageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changed = diesel::update(
            messages::table
                .filter(messages::receiver_id.eq(*reader.as_uuid()))
                .filter(messages::sender_id.eq(*sender.as_uuid()))
                .filter(messages::read.eq(false)),
        )
        .set(messages::read.eq(true))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(changed as u64)
    }
}
