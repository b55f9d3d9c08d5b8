//! HTTP server configuration.

use std::net::SocketAddr;

use helpdesk::inbound::http::session_config::SessionSettings;

/// Listener and session settings for [`super::create_server`].
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
}

impl ServerConfig {
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr) -> Self {
        Self { session, bind_addr }
    }
}
