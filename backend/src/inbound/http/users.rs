//! Account and session handlers.
//!
//! ```text
//! POST /api/v1/login {"email":"ada@campus.test","password":"correct horse"}
//! POST /api/v1/users {"name":"Ada","email":"ada@campus.test","password":"correct horse"}
//! GET  /api/v1/users/me
//! ```

use actix_web::{HttpResponse, get, patch, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::ports::Registration;
use crate::domain::{
    Department, Email, Error, LoginCredentials, LoginValidationError, NewPassword, ProfileUpdate,
    UserName,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::UserResponse;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field_error, missing_field_error};

const DEFAULT_LEADERBOARD_SIZE: u32 = 10;

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "ada@campus.test")]
    pub email: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password)
    }
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyEmail => Error::invalid_request("email must not be empty")
            .with_details(json!({ "field": "email", "code": "empty_email" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
        LoginValidationError::PasswordTooShort { .. } => {
            invalid_field_error(FieldName::new("password"), err)
        }
    }
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = UserResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let user_id = state.login.authenticate(&credentials).await?;
    session.persist_user(&user_id)?;
    let user = state.accounts.current(&user_id).await?;
    Ok(web::Json(UserResponse::from(user)))
}

/// End the session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["users"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

/// Registration body for `POST /api/v1/users`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, Error> {
    value.ok_or_else(|| missing_field_error(FieldName::new(field)))
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = Error;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        let name = required(value.name, "name")?;
        let email = required(value.email, "email")?;
        let password = required(value.password, "password")?;
        Ok(Self {
            name: UserName::new(&name).map_err(|err| invalid_field_error(FieldName::new("name"), err))?,
            email: Email::new(&email)
                .map_err(|err| invalid_field_error(FieldName::new("email"), err))?,
            password: NewPassword::new(&password)
                .map_err(|err| invalid_field_error(FieldName::new("password"), err))?,
        })
    }
}

/// Register a student account and sign it in.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error)
    ),
    tags = ["users"],
    operation_id = "register",
    security([])
)]
#[post("/users")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration = Registration::try_from(payload.into_inner())?;
    let user = state.accounts.register(registration).await?;
    session.persist_user(user.id())?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// The signed-in account.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserResponse>> {
    let user_id = session.require_user_id()?;
    let user = state.accounts.current(&user_id).await?;
    Ok(web::Json(UserResponse::from(user)))
}

/// Profile edit body. Points and role are not accepted.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub name: Option<String>,
    pub department: Option<String>,
}

impl TryFrom<ProfileRequest> for ProfileUpdate {
    type Error = Error;

    fn try_from(value: ProfileRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: value
                .name
                .map(UserName::new)
                .transpose()
                .map_err(|err| invalid_field_error(FieldName::new("name"), err))?,
            department: value
                .department
                .map(Department::new)
                .transpose()
                .map_err(|err| invalid_field_error(FieldName::new("department"), err))?,
        })
    }
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateProfile"
)]
#[patch("/users/me")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ProfileRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let user_id = session.require_user_id()?;
    let update = ProfileUpdate::try_from(payload.into_inner())?;
    let user = state.accounts.update_profile(&user_id, update).await?;
    Ok(web::Json(UserResponse::from(user)))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct LeaderboardQuery {
    /// Number of entries, capped server-side.
    pub limit: Option<u32>,
}

/// Users ordered by points, highest first.
#[utoipa::path(
    get,
    path = "/api/v1/users/leaderboard",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Leaderboard", body = [UserResponse]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "leaderboard"
)]
#[get("/users/leaderboard")]
pub async fn leaderboard(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<LeaderboardQuery>,
) -> ApiResult<web::Json<Vec<UserResponse>>> {
    session.require_user_id()?;
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_SIZE);
    let users = state.accounts.leaderboard(limit).await?;
    Ok(web::Json(users.iter().map(UserResponse::from).collect()))
}
