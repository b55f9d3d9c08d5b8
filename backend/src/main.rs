//! Backend entry-point: loads settings, migrates the schema, wires the
//! services and serves the REST API.

mod server;

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::{DefaultClock, DefaultEnv};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use helpdesk::domain::Retrier;
use helpdesk::inbound::http::health::HealthState;
use helpdesk::inbound::http::session_config::{BuildMode, session_settings_from_env};
use helpdesk::outbound::persistence::{DbPool, run_pending_migrations};
use helpdesk::settings::AppSettings;

use server::{DieselRepositories, ServerConfig, build_http_state, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(io::Error::other)?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(io::Error::other)?;
    let bind_addr = settings.bind_addr().map_err(io::Error::other)?;
    let pool_config = settings.pool_config().map_err(io::Error::other)?;
    let admin_seed = settings.admin_seed().map_err(io::Error::other)?;

    let applied = run_pending_migrations(pool_config.database_url())
        .await
        .map_err(io::Error::other)?;
    info!(applied, "database migrations complete");

    let pool = DbPool::new(pool_config).await.map_err(io::Error::other)?;
    let clock = Arc::new(DefaultClock);
    let retrier = Retrier::new(settings.retry_policy(), clock.clone());
    let (http_state, accounts) =
        build_http_state(DieselRepositories::from_pool(&pool), clock, retrier);

    if let Some(seed) = admin_seed {
        let created = accounts.ensure_admin(seed).await.map_err(io::Error::other)?;
        info!(created, "administrator account checked");
    }

    let health_state = web::Data::new(HealthState::new());
    create_server(
        health_state,
        web::Data::new(http_state),
        ServerConfig::new(session, bind_addr),
    )?
    .await
}
