//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{HttpResponse, post, test as actix_test, web};
use chrono::{NaiveDate, TimeZone, Utc};

use crate::domain::ports::{
    MockComplaintCommand, MockComplaintQuery, MockLoginService, MockMessaging,
    MockNotificationInbox, MockTechnicalTeamAdmin, MockUserAccounts,
};
use crate::domain::{
    Category, Complaint, ComplaintId, Difficulty, Email, NewComplaint, Role, User, UserDraft,
    UserId, UserName,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Extract the `session` cookie set by a response.
pub fn session_cookie(response: &ServiceResponse) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// Mock ports, one per [`HttpState`] field. Set expectations on the fields
/// a test needs, then call [`MockPorts::into_state`].
#[derive(Default)]
pub struct MockPorts {
    pub login: MockLoginService,
    pub accounts: MockUserAccounts,
    pub complaints: MockComplaintCommand,
    pub complaint_query: MockComplaintQuery,
    pub notifications: MockNotificationInbox,
    pub messaging: MockMessaging,
    pub technical_team: MockTechnicalTeamAdmin,
}

impl MockPorts {
    pub fn into_state(self) -> HttpState {
        HttpState {
            login: Arc::new(self.login),
            accounts: Arc::new(self.accounts),
            complaints: Arc::new(self.complaints),
            complaint_query: Arc::new(self.complaint_query),
            notifications: Arc::new(self.notifications),
            messaging: Arc::new(self.messaging),
            technical_team: Arc::new(self.technical_team),
        }
    }
}

/// A valid user with the given role; technical users get a department.
pub fn sample_user(name: &str, role: Role) -> User {
    User::new(UserDraft {
        id: UserId::random(),
        name: UserName::new(name).expect("valid name"),
        email: Email::new(format!("{}@campus.test", name.to_lowercase())).expect("valid email"),
        role,
        department: (role == Role::Technical)
            .then(|| crate::domain::Department::new("plumbing").expect("valid department")),
        points: 0,
    })
    .expect("valid user")
}

/// Test-only route that signs in as the user id in the path.
#[post("/test/session/{id}")]
pub async fn establish_session(session: SessionContext, path: web::Path<String>) -> HttpResponse {
    let user_id = UserId::new(path.as_str()).expect("valid user id");
    session.persist_user(&user_id).expect("persist session");
    HttpResponse::NoContent().finish()
}

/// Sign in through [`establish_session`] and return the session cookie.
pub async fn login_as<S>(app: &S, user_id: &UserId) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri(&format!("/test/session/{user_id}"))
            .to_request(),
    )
    .await;
    assert!(res.status().is_success(), "test login failed");
    session_cookie(&res)
}

/// An open plumbing complaint raised by `raised_by`.
pub fn sample_complaint(raised_by: &User) -> Complaint {
    Complaint::open(
        ComplaintId::random(),
        NewComplaint {
            title: "Leaking tap".to_owned(),
            description: "Drips all night".to_owned(),
            category: Category::new("plumbing").expect("valid category"),
            location: Some("Hall B".to_owned()),
            difficulty: Difficulty::Medium,
            emergency: false,
            fix_till_date: NaiveDate::from_ymd_opt(2026, 2, 1).expect("valid date"),
        },
        *raised_by.id(),
        Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0)
            .single()
            .expect("valid timestamp"),
    )
}
