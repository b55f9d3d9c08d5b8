//! Driving port for technical team administration.

use async_trait::async_trait;

use crate::domain::{Department, Error, TechnicalMember, UserId};

use super::Registration;

/// Account details for a new technical team member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTechnicalMember {
    pub account: Registration,
    pub department: Department,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TechnicalTeamAdmin: Send + Sync {
    /// Roster visible to any signed-in user.
    async fn list(&self) -> Result<Vec<TechnicalMember>, Error>;

    /// Create a technical account with its roster row; administrators only.
    async fn add_member(
        &self,
        actor: &UserId,
        member: NewTechnicalMember,
    ) -> Result<TechnicalMember, Error>;

    /// Flip a member's availability; administrators only.
    async fn toggle_availability(
        &self,
        actor: &UserId,
        member: &UserId,
    ) -> Result<TechnicalMember, Error>;
}
