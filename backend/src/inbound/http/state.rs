//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on driving ports and stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    ComplaintCommand, ComplaintQuery, LoginService, Messaging, NotificationInbox,
    TechnicalTeamAdmin, UserAccounts,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub accounts: Arc<dyn UserAccounts>,
    pub complaints: Arc<dyn ComplaintCommand>,
    pub complaint_query: Arc<dyn ComplaintQuery>,
    pub notifications: Arc<dyn NotificationInbox>,
    pub messaging: Arc<dyn Messaging>,
    pub technical_team: Arc<dyn TechnicalTeamAdmin>,
}
