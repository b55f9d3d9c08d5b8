//! Domain primitives, the complaint lifecycle engine, and the services that
//! implement the driving ports.
//!
//! Purpose: define strongly typed entities used by the HTTP and persistence
//! layers. Types validate at construction and keep their invariants private;
//! services orchestrate them through the ports in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - User, Complaint, Notification, Message, TechnicalMember: entities.
//! - `plan_transition`: the pure lifecycle engine.
//! - `*Service`: driving port implementations over driven ports.

pub mod auth;
pub mod complaint;
pub mod complaint_service;
pub mod error;
pub mod lifecycle;
pub mod message;
pub mod messaging_service;
pub mod notification;
pub mod notification_service;
pub mod ports;
pub mod retry;
pub mod technical_team;
pub mod technical_team_service;
pub mod trace_id;
pub mod user;
pub mod user_account_service;

pub use self::auth::{
    LoginCredentials, LoginValidationError, NewPassword, PASSWORD_MIN, PasswordDigest,
    PasswordDigestError,
};
pub use self::complaint::{
    Category, Complaint, ComplaintDraft, ComplaintEdit, ComplaintFilter, ComplaintId,
    ComplaintStatus, ComplaintSubmission, ComplaintValidationError, DEFAULT_POINTS, Difficulty,
    NewComplaint, Volunteer, points_for, sort_for_volunteers, volunteer_queue_order,
};
pub use self::complaint_service::ComplaintService;
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::lifecycle::{
    Actor, PlannedTransition, PointsAward, Transition, TransitionError, authorize_create,
    authorize_delete, authorize_edit, can_accept, plan_transition,
};
pub use self::message::{Message, MessageDraft, MessageId, MessageValidationError};
pub use self::messaging_service::MessagingService;
pub use self::notification::{
    Notification, NotificationDraft, NotificationId, NotificationKind,
    NotificationValidationError,
};
pub use self::notification_service::NotificationService;
pub use self::retry::{
    AttemptJitter, BackoffJitter, Retrier, RetryPolicy, Sleeper, TokioSleeper,
};
pub use self::technical_team::TechnicalMember;
pub use self::technical_team_service::TechnicalTeamService;
pub use self::trace_id::TraceId;
pub use self::user::{
    Department, Email, ProfileUpdate, Role, User, UserDraft, UserId, UserName,
    UserValidationError,
};
pub use self::user_account_service::{AdminSeed, UserAccountService};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use helpdesk::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
