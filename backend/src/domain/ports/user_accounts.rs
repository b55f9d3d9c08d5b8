//! Driving port for account registration and profile use-cases.

use async_trait::async_trait;

use crate::domain::{Email, Error, NewPassword, ProfileUpdate, User, UserId, UserName};

/// Validated self-service registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: UserName,
    pub email: Email,
    pub password: NewPassword,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserAccounts: Send + Sync {
    /// Create a student account with zero points.
    async fn register(&self, registration: Registration) -> Result<User, Error>;

    /// The account behind a session.
    async fn current(&self, user_id: &UserId) -> Result<User, Error>;

    /// Change name and, for technical members, department.
    async fn update_profile(&self, user_id: &UserId, update: ProfileUpdate)
    -> Result<User, Error>;

    /// Highest-scoring users first.
    async fn leaderboard(&self, limit: u32) -> Result<Vec<User>, Error>;
}
