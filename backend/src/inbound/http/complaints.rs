//! Complaint lifecycle handlers.
//!
//! ```text
//! POST   /api/v1/complaints
//! GET    /api/v1/complaints?status=open&category=plumbing
//! GET    /api/v1/complaints/queue
//! GET    /api/v1/complaints/{id}
//! POST   /api/v1/complaints/{id}/accept
//! POST   /api/v1/complaints/{id}/transfer
//! POST   /api/v1/complaints/{id}/resolve
//! PATCH  /api/v1/complaints/{id}
//! DELETE /api/v1/complaints/{id}
//! ```
//!
//! Status changes only happen through the three transition routes; the edit
//! route rejects a `status` field outright.

use std::str::FromStr;

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Category, ComplaintEdit, ComplaintFilter, ComplaintId, ComplaintStatus, ComplaintSubmission,
    Error, Transition, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{ComplaintResponse, double_option};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_field_error, parse_optional_date, parse_uuid,
};

/// Body for `POST /api/v1/complaints`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateComplaintRequest {
    #[schema(example = "Leaking tap")]
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(example = "plumbing")]
    pub category: Option<String>,
    #[schema(example = "Hall B, room 12")]
    pub location: Option<String>,
    /// One of `easy`, `medium` or `hard`.
    #[schema(example = "medium")]
    pub difficulty: Option<String>,
    pub emergency: Option<bool>,
    #[schema(format = Date, example = "2026-02-01")]
    pub fix_till_date: Option<String>,
}

impl TryFrom<CreateComplaintRequest> for ComplaintSubmission {
    type Error = Error;

    fn try_from(value: CreateComplaintRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            fix_till_date: parse_optional_date(
                value.fix_till_date.as_deref(),
                FieldName::new("fixTillDate"),
            )?,
            title: value.title,
            description: value.description,
            category: value.category,
            location: value.location,
            difficulty: value.difficulty,
            emergency: value.emergency.unwrap_or(false),
        })
    }
}

/// Body for `PATCH /api/v1/complaints/{id}`.
///
/// `location: null` clears the location; an absent field leaves it alone.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditComplaintRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub location: Option<Option<String>>,
    pub emergency: Option<bool>,
    #[schema(format = Date)]
    pub fix_till_date: Option<String>,
    /// Rejected when present.
    #[serde(default)]
    #[schema(value_type = Option<String>, read_only)]
    pub status: Option<serde_json::Value>,
}

impl TryFrom<EditComplaintRequest> for ComplaintEdit {
    type Error = Error;

    fn try_from(value: EditComplaintRequest) -> Result<Self, Self::Error> {
        if value.status.is_some() {
            return Err(Error::invalid_request(
                "status changes go through accept, transfer or resolve",
            )
            .with_details(json!({ "field": "status", "code": "read_only_field" })));
        }
        Ok(Self {
            fix_till_date: parse_optional_date(
                value.fix_till_date.as_deref(),
                FieldName::new("fixTillDate"),
            )?,
            title: value.title,
            description: value.description,
            location: value.location,
            emergency: value.emergency,
        })
    }
}

/// Query string for `GET /api/v1/complaints`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ComplaintListQuery {
    /// Raiser's user id.
    pub raised_by: Option<String>,
    /// `open`, `in-progress`, `resolved` or `closed`.
    pub status: Option<String>,
    pub category: Option<String>,
    pub volunteer_id: Option<String>,
}

fn optional_user(raw: Option<&str>, field: FieldName) -> Result<Option<UserId>, Error> {
    raw.map(|value| parse_uuid(value, field).map(UserId::from_uuid))
        .transpose()
}

impl TryFrom<ComplaintListQuery> for ComplaintFilter {
    type Error = Error;

    fn try_from(value: ComplaintListQuery) -> Result<Self, Self::Error> {
        let status = value
            .status
            .as_deref()
            .map(ComplaintStatus::from_str)
            .transpose()
            .map_err(|err| invalid_field_error(FieldName::new("status"), err))?;
        let category = value
            .category
            .map(Category::new)
            .transpose()
            .map_err(|err| invalid_field_error(FieldName::new("category"), err))?;
        Ok(Self {
            raised_by: optional_user(value.raised_by.as_deref(), FieldName::new("raisedBy"))?,
            status,
            category,
            volunteer_id: optional_user(
                value.volunteer_id.as_deref(),
                FieldName::new("volunteerId"),
            )?,
        })
    }
}

fn complaint_id(raw: &str) -> Result<ComplaintId, Error> {
    parse_uuid(raw, FieldName::new("id")).map(ComplaintId::from_uuid)
}

/// Raise a complaint as the signed-in student.
#[utoipa::path(
    post,
    path = "/api/v1/complaints",
    request_body = CreateComplaintRequest,
    responses(
        (status = 201, description = "Complaint opened", body = ComplaintResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Only students raise complaints", body = Error)
    ),
    tags = ["complaints"],
    operation_id = "createComplaint"
)]
#[post("/complaints")]
pub async fn create_complaint(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateComplaintRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let submission = ComplaintSubmission::try_from(payload.into_inner())?;
    let complaint = state.complaints.create(&user_id, submission).await?;
    debug!(complaint_id = %complaint.id().as_uuid(), "complaint opened");
    Ok(HttpResponse::Created().json(ComplaintResponse::from(complaint)))
}

/// Filtered complaint list, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/complaints",
    params(ComplaintListQuery),
    responses(
        (status = 200, description = "Complaints", body = [ComplaintResponse]),
        (status = 400, description = "Invalid filter", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["complaints"],
    operation_id = "listComplaints"
)]
#[get("/complaints")]
pub async fn list_complaints(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ComplaintListQuery>,
) -> ApiResult<web::Json<Vec<ComplaintResponse>>> {
    let user_id = session.require_user_id()?;
    let filter = ComplaintFilter::try_from(query.into_inner())?;
    let complaints = state.complaint_query.list(&user_id, filter).await?;
    Ok(web::Json(
        complaints.into_iter().map(ComplaintResponse::from).collect(),
    ))
}

/// Open complaints the signed-in volunteer may accept.
#[utoipa::path(
    get,
    path = "/api/v1/complaints/queue",
    responses(
        (status = 200, description = "Volunteer queue", body = [ComplaintResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Role cannot volunteer", body = Error)
    ),
    tags = ["complaints"],
    operation_id = "complaintQueue"
)]
#[get("/complaints/queue")]
pub async fn complaint_queue(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<ComplaintResponse>>> {
    let user_id = session.require_user_id()?;
    let complaints = state.complaint_query.queue(&user_id).await?;
    Ok(web::Json(
        complaints.into_iter().map(ComplaintResponse::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/complaints/{id}",
    params(("id" = String, Path, description = "Complaint id", format = Uuid)),
    responses(
        (status = 200, description = "Complaint", body = ComplaintResponse),
        (status = 400, description = "Invalid id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["complaints"],
    operation_id = "getComplaint"
)]
#[get("/complaints/{id}")]
pub async fn get_complaint(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ComplaintResponse>> {
    let user_id = session.require_user_id()?;
    let id = complaint_id(&path)?;
    let complaint = state.complaint_query.get(&user_id, &id).await?;
    Ok(web::Json(ComplaintResponse::from(complaint)))
}

async fn apply_transition(
    state: &HttpState,
    session: &SessionContext,
    raw_id: &str,
    transition: Transition,
) -> ApiResult<web::Json<ComplaintResponse>> {
    let user_id = session.require_user_id()?;
    let id = complaint_id(raw_id)?;
    let complaint = state.complaints.transition(&user_id, &id, transition).await?;
    debug!(
        complaint_id = %id.as_uuid(),
        transition = transition.as_str(),
        status = complaint.status().as_str(),
        "complaint transitioned"
    );
    Ok(web::Json(ComplaintResponse::from(complaint)))
}

/// Volunteer for an open complaint.
#[utoipa::path(
    post,
    path = "/api/v1/complaints/{id}/accept",
    params(("id" = String, Path, description = "Complaint id", format = Uuid)),
    responses(
        (status = 200, description = "Complaint in progress", body = ComplaintResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not permitted", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Not open or lost a race", body = Error)
    ),
    tags = ["complaints"],
    operation_id = "acceptComplaint"
)]
#[post("/complaints/{id}/accept")]
pub async fn accept_complaint(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ComplaintResponse>> {
    apply_transition(&state, &session, &path, Transition::Accept).await
}

/// Hand an in-progress complaint back to the queue.
#[utoipa::path(
    post,
    path = "/api/v1/complaints/{id}/transfer",
    params(("id" = String, Path, description = "Complaint id", format = Uuid)),
    responses(
        (status = 200, description = "Complaint reopened", body = ComplaintResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the assigned volunteer", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Not in progress", body = Error)
    ),
    tags = ["complaints"],
    operation_id = "transferComplaint"
)]
#[post("/complaints/{id}/transfer")]
pub async fn transfer_complaint(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ComplaintResponse>> {
    apply_transition(&state, &session, &path, Transition::Transfer).await
}

/// Mark a complaint resolved and credit the volunteer.
#[utoipa::path(
    post,
    path = "/api/v1/complaints/{id}/resolve",
    params(("id" = String, Path, description = "Complaint id", format = Uuid)),
    responses(
        (status = 200, description = "Complaint resolved", body = ComplaintResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the assigned volunteer", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Not in progress or lost a race", body = Error)
    ),
    tags = ["complaints"],
    operation_id = "resolveComplaint"
)]
#[post("/complaints/{id}/resolve")]
pub async fn resolve_complaint(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ComplaintResponse>> {
    apply_transition(&state, &session, &path, Transition::Resolve).await
}

/// Edit an open complaint as its raiser.
#[utoipa::path(
    patch,
    path = "/api/v1/complaints/{id}",
    params(("id" = String, Path, description = "Complaint id", format = Uuid)),
    request_body = EditComplaintRequest,
    responses(
        (status = 200, description = "Updated complaint", body = ComplaintResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the raiser", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "No longer open", body = Error)
    ),
    tags = ["complaints"],
    operation_id = "editComplaint"
)]
#[patch("/complaints/{id}")]
pub async fn edit_complaint(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<EditComplaintRequest>,
) -> ApiResult<web::Json<ComplaintResponse>> {
    let user_id = session.require_user_id()?;
    let id = complaint_id(&path)?;
    let edit = ComplaintEdit::try_from(payload.into_inner())?;
    let complaint = state.complaints.edit(&user_id, &id, edit).await?;
    Ok(web::Json(ComplaintResponse::from(complaint)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/complaints/{id}",
    params(("id" = String, Path, description = "Complaint id", format = Uuid)),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Administrators only", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["complaints"],
    operation_id = "deleteComplaint"
)]
#[delete("/complaints/{id}")]
pub async fn delete_complaint(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let id = complaint_id(&path)?;
    state.complaints.delete(&user_id, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "complaints_tests.rs"]
mod tests;
