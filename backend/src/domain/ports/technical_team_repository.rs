//! Port for the technical team roster.

use async_trait::async_trait;

use crate::domain::{PasswordDigest, TechnicalMember, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by technical team repository adapters.
    pub enum TechnicalTeamRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "technical team repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "technical team repository query failed: {message}",
        /// Another account already uses the email address.
        DuplicateEmail { email: String } => "email already registered: {email}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TechnicalTeamRepository: Send + Sync {
    /// Insert a technical user and its roster row in one transaction.
    async fn create_member(
        &self,
        user: &User,
        digest: &PasswordDigest,
        available: bool,
    ) -> Result<TechnicalMember, TechnicalTeamRepositoryError>;

    /// Roster ordered by department, then name.
    async fn list(&self) -> Result<Vec<TechnicalMember>, TechnicalTeamRepositoryError>;

    /// Atomically flip availability, returning the updated row or `None` when
    /// the user has no roster entry.
    async fn toggle_availability(
        &self,
        user_id: &UserId,
    ) -> Result<Option<TechnicalMember>, TechnicalTeamRepositoryError>;
}
