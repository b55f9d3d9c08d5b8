//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;
pub use state_builders::{DieselRepositories, build_http_state};

use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::info;

use helpdesk::Trace;
#[cfg(debug_assertions)]
use helpdesk::doc::ApiDoc;
use helpdesk::inbound::http::complaints::{
    accept_complaint, complaint_queue, create_complaint, delete_complaint, edit_complaint,
    get_complaint, list_complaints, resolve_complaint, transfer_complaint,
};
use helpdesk::inbound::http::health::{HealthState, live, ready};
use helpdesk::inbound::http::messages::{conversation, mark_conversation_read, send_message};
use helpdesk::inbound::http::notifications::{
    list_notifications, mark_all_notifications_read, mark_notification_read, send_notification,
};
use helpdesk::inbound::http::state::HttpState;
use helpdesk::inbound::http::technical_team::{
    add_technical_member, list_technical_team, toggle_availability,
};
use helpdesk::inbound::http::users::{
    current_user, leaderboard, login, logout, register, update_profile,
};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// The `/api/v1` scope with every REST handler. `complaints/queue` is
/// registered ahead of `complaints/{id}` so it is not captured as an id.
fn api_scope(
    session: SessionMiddleware<CookieSessionStore>,
) -> actix_web::Scope<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    web::scope("/api/v1")
        .wrap(session)
        .service(login)
        .service(logout)
        .service(register)
        .service(current_user)
        .service(update_profile)
        .service(leaderboard)
        .service(create_complaint)
        .service(list_complaints)
        .service(complaint_queue)
        .service(get_complaint)
        .service(accept_complaint)
        .service(transfer_complaint)
        .service(resolve_complaint)
        .service(edit_complaint)
        .service(delete_complaint)
        .service(list_notifications)
        .service(mark_all_notifications_read)
        .service(mark_notification_read)
        .service(send_notification)
        .service(send_message)
        .service(conversation)
        .service(mark_conversation_read)
        .service(list_technical_team)
        .service(add_technical_member)
        .service(toggle_availability)
}

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    session: SessionMiddleware<CookieSessionStore>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api_scope(session))
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Bind the listener and return the running server.
///
/// Readiness flips once the socket is bound.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when binding fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig { session, bind_addr } = config;
    info!(
        key_fingerprint = %session.key_fingerprint(),
        cookie_secure = session.cookie_secure,
        "session cookies configured"
    );

    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        build_app(
            server_health_state.clone(),
            http_state.clone(),
            session.middleware(),
        )
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    info!(%bind_addr, "listening");
    Ok(server)
}
