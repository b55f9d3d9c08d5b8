//! Account services: registration, login, profile edits and the leaderboard.
//!
//! Also hosts the helpers other services use to resolve the session user into
//! a domain [`User`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::ports::{
    LoginService, Registration, UserAccounts, UserPersistenceError, UserRepository,
};
use crate::domain::{
    Email, Error, LoginCredentials, NewPassword, PasswordDigest, ProfileUpdate, Retrier, Role,
    User, UserDraft, UserId, UserName,
};

/// Upper bound for leaderboard page sizes.
pub const LEADERBOARD_MAX: u32 = 100;

pub(crate) fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateEmail { email } => {
            Error::conflict("email already registered")
                .with_details(json!({ "field": "email", "value": email }))
        }
    }
}

pub(crate) fn digest_password(password: &NewPassword) -> Result<PasswordDigest, Error> {
    password
        .digest()
        .map_err(|err| Error::internal(err.to_string()))
}

/// Load the user behind a session. A session whose user has vanished is
/// treated as unauthenticated.
pub(crate) async fn load_session_user<U>(
    users: &U,
    retrier: &Retrier,
    user_id: &UserId,
) -> Result<User, Error>
where
    U: UserRepository + ?Sized,
{
    retrier
        .run("users.find_by_id", || async move {
            users.find_by_id(user_id).await.map_err(map_user_error)
        })
        .await?
        .ok_or_else(|| Error::unauthorized("session user no longer exists"))
}

/// Bootstrap administrator account details.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: UserName,
    pub email: Email,
    pub password: NewPassword,
}

/// Account service implementing [`LoginService`] and [`UserAccounts`].
#[derive(Clone)]
pub struct UserAccountService<U> {
    users: Arc<U>,
    retrier: Retrier,
}

impl<U> UserAccountService<U> {
    /// Create a service over the user repository.
    pub fn new(users: Arc<U>, retrier: Retrier) -> Self {
        Self { users, retrier }
    }
}

impl<U> UserAccountService<U>
where
    U: UserRepository,
{
    /// Create the administrator account if its email is not yet registered.
    ///
    /// Returns `true` when an account was created.
    pub async fn ensure_admin(&self, seed: AdminSeed) -> Result<bool, Error> {
        let users = self.users.as_ref();
        let email = seed.email.as_ref();
        let existing = self
            .retrier
            .run("users.find_credentials", || async move {
                users.find_credentials(email).await.map_err(map_user_error)
            })
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        let admin = User::new(UserDraft {
            id: UserId::random(),
            name: seed.name,
            email: seed.email,
            role: Role::Admin,
            department: None,
            points: 0,
        })
        .map_err(|err| Error::internal(format!("invalid admin account: {err}")))?;
        let digest = digest_password(&seed.password)?;
        let (admin, digest) = (&admin, &digest);
        self.retrier
            .run("users.insert", || async move {
                users.insert(admin, digest).await.map_err(map_user_error)
            })
            .await?;
        Ok(true)
    }
}

#[async_trait]
impl<U> LoginService for UserAccountService<U>
where
    U: UserRepository,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let users = self.users.as_ref();
        let email = credentials.email();
        let stored = self
            .retrier
            .run("users.find_credentials", || async move {
                users.find_credentials(email).await.map_err(map_user_error)
            })
            .await?;
        match stored {
            Some(stored) if stored.digest.verify(credentials.password()) => {
                Ok(*stored.user.id())
            }
            _ => Err(Error::unauthorized("invalid credentials")),
        }
    }
}

#[async_trait]
impl<U> UserAccounts for UserAccountService<U>
where
    U: UserRepository,
{
    async fn register(&self, registration: Registration) -> Result<User, Error> {
        let Registration {
            name,
            email,
            password,
        } = registration;
        let user = User::new(UserDraft {
            id: UserId::random(),
            name,
            email,
            role: Role::Student,
            department: None,
            points: 0,
        })
        .map_err(|err| Error::invalid_request(err.to_string()))?;
        let digest = digest_password(&password)?;

        let users = self.users.as_ref();
        let (new_user, digest) = (&user, &digest);
        self.retrier
            .run("users.insert", || async move {
                users.insert(new_user, digest).await.map_err(map_user_error)
            })
            .await?;
        Ok(user)
    }

    async fn current(&self, user_id: &UserId) -> Result<User, Error> {
        load_session_user(self.users.as_ref(), &self.retrier, user_id).await
    }

    async fn update_profile(
        &self,
        user_id: &UserId,
        update: ProfileUpdate,
    ) -> Result<User, Error> {
        if update.is_empty() {
            return Err(Error::invalid_request("profile update must change a field"));
        }
        let user = load_session_user(self.users.as_ref(), &self.retrier, user_id).await?;
        let updated = user
            .with_profile(update)
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        let users = self.users.as_ref();
        let candidate = &updated;
        let found = self
            .retrier
            .run("users.update_profile", || async move {
                users.update_profile(candidate).await.map_err(map_user_error)
            })
            .await?;
        if !found {
            return Err(Error::unauthorized("session user no longer exists"));
        }
        Ok(updated)
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<User>, Error> {
        let limit = i64::from(limit.clamp(1, LEADERBOARD_MAX));
        let users = self.users.as_ref();
        self.retrier
            .run("users.leaderboard", || async move {
                users.leaderboard(limit).await.map_err(map_user_error)
            })
            .await
    }
}

#[cfg(test)]
#[path = "user_account_service_tests.rs"]
mod tests;
