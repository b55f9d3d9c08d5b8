//! Direct message handlers. Clients poll the conversation route.
//!
//! ```text
//! POST /api/v1/messages {"receiverId":"…","content":"On my way"}
//! GET  /api/v1/messages?with={userId}
//! POST /api/v1/messages/read?with={userId}
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::SendMessageRequest;
use crate::domain::{ComplaintId, Error, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{MessageResponse, UpdatedCount};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_field_error, parse_uuid};

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageBody {
    #[schema(format = Uuid)]
    pub receiver_id: Option<String>,
    /// Complaint the message is about, if any.
    #[schema(format = Uuid)]
    pub complaint_id: Option<String>,
    pub content: Option<String>,
}

impl TryFrom<SendMessageBody> for SendMessageRequest {
    type Error = Error;

    fn try_from(value: SendMessageBody) -> Result<Self, Self::Error> {
        let receiver = value
            .receiver_id
            .as_deref()
            .ok_or_else(|| missing_field_error(FieldName::new("receiverId")))
            .and_then(|raw| parse_uuid(raw, FieldName::new("receiverId")))
            .map(UserId::from_uuid)?;
        let complaint_id = value
            .complaint_id
            .as_deref()
            .map(|raw| parse_uuid(raw, FieldName::new("complaintId")).map(ComplaintId::from_uuid))
            .transpose()?;
        let content = value
            .content
            .ok_or_else(|| missing_field_error(FieldName::new("content")))?;
        Ok(Self {
            receiver,
            complaint_id,
            content,
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConversationQuery {
    /// The other participant.
    #[param(format = Uuid)]
    pub with: Option<String>,
}

impl ConversationQuery {
    fn other(&self) -> Result<UserId, Error> {
        let raw = self
            .with
            .as_deref()
            .ok_or_else(|| missing_field_error(FieldName::new("with")))?;
        parse_uuid(raw, FieldName::new("with")).map(UserId::from_uuid)
    }
}

/// Send a message; the receiver gets a `new_message` notification.
#[utoipa::path(
    post,
    path = "/api/v1/messages",
    request_body = SendMessageBody,
    responses(
        (status = 201, description = "Message sent", body = MessageResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Receiver not found", body = Error)
    ),
    tags = ["messages"],
    operation_id = "sendMessage"
)]
#[post("/messages")]
pub async fn send_message(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SendMessageBody>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let request = SendMessageRequest::try_from(payload.into_inner())?;
    let message = state.messaging.send(&user_id, request).await?;
    Ok(HttpResponse::Created().json(MessageResponse::from(message)))
}

/// Conversation with another user, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/messages",
    params(ConversationQuery),
    responses(
        (status = 200, description = "Conversation", body = [MessageResponse]),
        (status = 400, description = "Missing or invalid participant", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["messages"],
    operation_id = "conversation"
)]
#[get("/messages")]
pub async fn conversation(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ConversationQuery>,
) -> ApiResult<web::Json<Vec<MessageResponse>>> {
    let user_id = session.require_user_id()?;
    let other = query.other()?;
    let messages = state.messaging.conversation(&user_id, &other).await?;
    Ok(web::Json(
        messages.into_iter().map(MessageResponse::from).collect(),
    ))
}

/// Mark messages received from `with` as read.
#[utoipa::path(
    post,
    path = "/api/v1/messages/read",
    params(ConversationQuery),
    responses(
        (status = 200, description = "Number of messages marked read", body = UpdatedCount),
        (status = 400, description = "Missing or invalid participant", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["messages"],
    operation_id = "markConversationRead"
)]
#[post("/messages/read")]
pub async fn mark_conversation_read(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ConversationQuery>,
) -> ApiResult<web::Json<UpdatedCount>> {
    let user_id = session.require_user_id()?;
    let other = query.other()?;
    let updated = state.messaging.mark_read(&user_id, &other).await?;
    Ok(web::Json(UpdatedCount { updated }))
}
