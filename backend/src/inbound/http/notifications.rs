//! Notification inbox handlers.
//!
//! ```text
//! GET   /api/v1/notifications?unreadOnly=true
//! PATCH /api/v1/notifications/{id}
//! POST  /api/v1/notifications/read-all
//! POST  /api/v1/notifications {"userId":"…","type":"new_message","message":"…"}
//! ```

use std::str::FromStr;

use actix_web::{HttpResponse, get, patch, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    ComplaintId, Error, NotificationDraft, NotificationId, NotificationKind, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{NotificationResponse, UpdatedCount};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_field_error, missing_field_error, parse_uuid,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NotificationListQuery {
    /// Only return unread notifications.
    #[serde(default)]
    pub unread_only: bool,
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(NotificationListQuery),
    responses(
        (status = 200, description = "Notifications, newest first", body = [NotificationResponse]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "listNotifications"
)]
#[get("/notifications")]
pub async fn list_notifications(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<NotificationListQuery>,
) -> ApiResult<web::Json<Vec<NotificationResponse>>> {
    let user_id = session.require_user_id()?;
    let notifications = state
        .notifications
        .list(&user_id, query.unread_only)
        .await?;
    Ok(web::Json(
        notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
    ))
}

/// Mark one notification read. Repeating the call is harmless.
#[utoipa::path(
    patch,
    path = "/api/v1/notifications/{id}",
    params(("id" = String, Path, description = "Notification id", format = Uuid)),
    responses(
        (status = 200, description = "Notification marked read", body = NotificationResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the recipient", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "markNotificationRead"
)]
#[patch("/notifications/{id}")]
pub async fn mark_notification_read(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<NotificationResponse>> {
    let user_id = session.require_user_id()?;
    let id = NotificationId::from_uuid(parse_uuid(&path, FieldName::new("id"))?);
    let notification = state.notifications.mark_read(&user_id, &id).await?;
    Ok(web::Json(NotificationResponse::from(notification)))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    responses(
        (status = 200, description = "Number of notifications marked read", body = UpdatedCount),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "markAllNotificationsRead"
)]
#[post("/notifications/read-all")]
pub async fn mark_all_notifications_read(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UpdatedCount>> {
    let user_id = session.require_user_id()?;
    let updated = state.notifications.mark_all_read(&user_id).await?;
    Ok(web::Json(UpdatedCount { updated }))
}

/// Administrator notice body.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    #[schema(format = Uuid)]
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    #[schema(example = "complaint_accepted")]
    pub kind: Option<String>,
    pub message: Option<String>,
    #[schema(format = Uuid)]
    pub complaint_id: Option<String>,
}

impl TryFrom<SendNotificationRequest> for NotificationDraft {
    type Error = Error;

    fn try_from(value: SendNotificationRequest) -> Result<Self, Self::Error> {
        let recipient = value
            .user_id
            .as_deref()
            .ok_or_else(|| missing_field_error(FieldName::new("userId")))
            .and_then(|raw| parse_uuid(raw, FieldName::new("userId")))
            .map(UserId::from_uuid)?;
        let kind = value
            .kind
            .as_deref()
            .ok_or_else(|| missing_field_error(FieldName::new("type")))
            .and_then(|raw| {
                NotificationKind::from_str(raw)
                    .map_err(|err| invalid_field_error(FieldName::new("type"), err))
            })?;
        let complaint_id = value
            .complaint_id
            .as_deref()
            .map(|raw| parse_uuid(raw, FieldName::new("complaintId")).map(ComplaintId::from_uuid))
            .transpose()?;
        let message = value
            .message
            .ok_or_else(|| missing_field_error(FieldName::new("message")))?;
        Self::try_new(recipient, kind, message, complaint_id)
            .map_err(|err| invalid_field_error(FieldName::new("message"), err))
    }
}

/// Send a notification to one user; administrators only.
#[utoipa::path(
    post,
    path = "/api/v1/notifications",
    request_body = SendNotificationRequest,
    responses(
        (status = 201, description = "Notification stored", body = NotificationResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Administrators only", body = Error),
        (status = 404, description = "Recipient not found", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "sendNotification"
)]
#[post("/notifications")]
pub async fn send_notification(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SendNotificationRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let draft = NotificationDraft::try_from(payload.into_inner())?;
    let notification = state.notifications.send(&user_id, draft).await?;
    Ok(HttpResponse::Created().json(NotificationResponse::from(notification)))
}
