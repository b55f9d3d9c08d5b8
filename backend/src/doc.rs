//! OpenAPI document for the REST API.
//!
//! Served by Swagger UI at `/docs` in debug builds and printed by
//! `cargo run --bin openapi-dump` for client generation.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{ComplaintStatus, Error, ErrorCode, NotificationKind, Role};
use crate::inbound::http::complaints::{CreateComplaintRequest, EditComplaintRequest};
use crate::inbound::http::dto::{
    ComplaintResponse, MessageResponse, NotificationResponse, TechnicalMemberResponse,
    UpdatedCount, UserResponse,
};
use crate::inbound::http::messages::SendMessageBody;
use crate::inbound::http::notifications::SendNotificationRequest;
use crate::inbound::http::technical_team::NewMemberRequest;
use crate::inbound::http::users::{LoginRequest, ProfileRequest, RegisterRequest};

/// Adds the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login or POST /api/v1/users.",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Campus help-desk API",
        description = "Complaints, volunteers, points and notifications for campus facilities."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::register,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::update_profile,
        crate::inbound::http::users::leaderboard,
        crate::inbound::http::complaints::create_complaint,
        crate::inbound::http::complaints::list_complaints,
        crate::inbound::http::complaints::complaint_queue,
        crate::inbound::http::complaints::get_complaint,
        crate::inbound::http::complaints::accept_complaint,
        crate::inbound::http::complaints::transfer_complaint,
        crate::inbound::http::complaints::resolve_complaint,
        crate::inbound::http::complaints::edit_complaint,
        crate::inbound::http::complaints::delete_complaint,
        crate::inbound::http::notifications::list_notifications,
        crate::inbound::http::notifications::mark_notification_read,
        crate::inbound::http::notifications::mark_all_notifications_read,
        crate::inbound::http::notifications::send_notification,
        crate::inbound::http::messages::send_message,
        crate::inbound::http::messages::conversation,
        crate::inbound::http::messages::mark_conversation_read,
        crate::inbound::http::technical_team::list_technical_team,
        crate::inbound::http::technical_team::add_technical_member,
        crate::inbound::http::technical_team::toggle_availability,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Role,
        ComplaintStatus,
        NotificationKind,
        UserResponse,
        ComplaintResponse,
        NotificationResponse,
        MessageResponse,
        TechnicalMemberResponse,
        UpdatedCount,
        LoginRequest,
        RegisterRequest,
        ProfileRequest,
        CreateComplaintRequest,
        EditComplaintRequest,
        SendNotificationRequest,
        SendMessageBody,
        NewMemberRequest,
    )),
    tags(
        (name = "users", description = "Accounts, sessions and the leaderboard"),
        (name = "complaints", description = "Complaint lifecycle"),
        (name = "notifications", description = "Notification inbox"),
        (name = "messages", description = "Direct messages"),
        (name = "technical-team", description = "Technical team roster"),
        (name = "health", description = "Probes")
    )
)]
pub struct ApiDoc;
