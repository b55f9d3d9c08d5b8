//! Technical team roster handlers.
//!
//! ```text
//! GET  /api/v1/technical-team
//! POST /api/v1/admin/technical-team {"name":"Tess","email":"tess@campus.test","password":"…","department":"plumbing"}
//! POST /api/v1/admin/technical-team/{userId}/availability
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::ports::{NewTechnicalMember, Registration};
use crate::domain::{Department, Error, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::TechnicalMemberResponse;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::RegisterRequest;
use crate::inbound::http::validation::{
    FieldName, invalid_field_error, missing_field_error, parse_uuid,
};

/// Body for `POST /api/v1/admin/technical-team`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewMemberRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[schema(example = "electrical")]
    pub department: Option<String>,
}

impl TryFrom<NewMemberRequest> for NewTechnicalMember {
    type Error = Error;

    fn try_from(value: NewMemberRequest) -> Result<Self, Self::Error> {
        let account = Registration::try_from(RegisterRequest {
            name: value.name,
            email: value.email,
            password: value.password,
        })?;
        let department = value
            .department
            .ok_or_else(|| missing_field_error(FieldName::new("department")))?;
        let department = Department::new(department)
            .map_err(|err| invalid_field_error(FieldName::new("department"), err))?;
        Ok(Self {
            account,
            department,
        })
    }
}

/// Roster ordered by department then name.
#[utoipa::path(
    get,
    path = "/api/v1/technical-team",
    responses(
        (status = 200, description = "Technical team", body = [TechnicalMemberResponse]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["technical-team"],
    operation_id = "listTechnicalTeam"
)]
#[get("/technical-team")]
pub async fn list_technical_team(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<TechnicalMemberResponse>>> {
    session.require_user_id()?;
    let members = state.technical_team.list().await?;
    Ok(web::Json(
        members
            .into_iter()
            .map(TechnicalMemberResponse::from)
            .collect(),
    ))
}

/// Create a technical account; administrators only.
#[utoipa::path(
    post,
    path = "/api/v1/admin/technical-team",
    request_body = NewMemberRequest,
    responses(
        (status = 201, description = "Member created", body = TechnicalMemberResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Administrators only", body = Error),
        (status = 409, description = "Email already registered", body = Error)
    ),
    tags = ["technical-team"],
    operation_id = "addTechnicalMember"
)]
#[post("/admin/technical-team")]
pub async fn add_technical_member(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<NewMemberRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let member = NewTechnicalMember::try_from(payload.into_inner())?;
    let created = state.technical_team.add_member(&user_id, member).await?;
    info!(member = %created.user_id, department = %created.department, "technical member added");
    Ok(HttpResponse::Created().json(TechnicalMemberResponse::from(created)))
}

/// Flip a member's availability; administrators only.
#[utoipa::path(
    post,
    path = "/api/v1/admin/technical-team/{userId}/availability",
    params(("userId" = String, Path, description = "Member's user id", format = Uuid)),
    responses(
        (status = 200, description = "Updated member", body = TechnicalMemberResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Administrators only", body = Error),
        (status = 404, description = "Not a technical member", body = Error)
    ),
    tags = ["technical-team"],
    operation_id = "toggleTechnicalAvailability"
)]
#[post("/admin/technical-team/{user_id}/availability")]
pub async fn toggle_availability(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<TechnicalMemberResponse>> {
    let actor = session.require_user_id()?;
    let member = UserId::from_uuid(parse_uuid(&path, FieldName::new("userId"))?);
    let updated = state
        .technical_team
        .toggle_availability(&actor, &member)
        .await?;
    Ok(web::Json(TechnicalMemberResponse::from(updated)))
}
