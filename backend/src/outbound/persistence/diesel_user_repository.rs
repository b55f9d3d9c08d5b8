//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{StoredCredentials, UserPersistenceError, UserRepository};
use crate::domain::{
    Department, Email, PasswordDigest, Role, User, UserDraft, UserId, UserName,
};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error, stored_count,
};
use super::models::{CredentialRow, NewUserRow, UserProfileUpdate, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{complaints, users};

/// Diesel-backed implementation of the user repository port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    map_basic_pool_error(error, UserPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    map_basic_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

/// Convert a stored row into a validated user.
pub(super) fn row_to_user(row: UserRow) -> Result<User, String> {
    let UserRow {
        id,
        name,
        email,
        role,
        department,
        points,
    } = row;
    let role: Role = role.parse().map_err(|err| format!("{err}"))?;
    User::new(UserDraft {
        id: UserId::from_uuid(id),
        name: UserName::new(name).map_err(|err| err.to_string())?,
        email: Email::new(email).map_err(|err| err.to_string())?,
        role,
        department: department
            .map(Department::new)
            .transpose()
            .map_err(|err| err.to_string())?,
        points: stored_count(points, "points")?,
    })
    .map_err(|err| err.to_string())
}

/// Build the insert row for a new account.
pub(super) fn new_user_row<'a>(user: &'a User, digest: &'a PasswordDigest) -> NewUserRow<'a> {
    NewUserRow {
        id: *user.id().as_uuid(),
        name: user.name().as_ref(),
        email: user.email().as_ref(),
        password_digest: digest.as_str(),
        role: user.role().as_str(),
        department: user.department().map(AsRef::as_ref),
        points: 0,
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(
        &self,
        user: &User,
        digest: &PasswordDigest,
    ) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users::table)
            .values(&new_user_row(user, digest))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                if is_unique_violation(&err) {
                    UserPersistenceError::duplicate_email(user.email().as_ref())
                } else {
                    map_diesel_error(err)
                }
            })
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_user)
            .transpose()
            .map_err(UserPersistenceError::query)
    }

    async fn find_credentials(
        &self,
        email: &str,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::email.eq(email))
            .select(CredentialRow::as_select())
            .first::<CredentialRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(CredentialRow {
            user,
            password_digest,
        }) = row
        else {
            return Ok(None);
        };
        Ok(Some(StoredCredentials {
            user: row_to_user(user).map_err(UserPersistenceError::query)?,
            digest: PasswordDigest::from_stored(password_digest),
        }))
    }

    async fn update_profile(&self, user: &User) -> Result<bool, UserPersistenceError> {
        let id = *user.id().as_uuid();
        let name = user.name().as_ref();
        let changes = UserProfileUpdate {
            name,
            department: user.department().map(AsRef::as_ref),
        };
        let changes = &changes;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                let updated = diesel::update(users::table.find(id))
                    .set(changes)
                    .execute(conn)
                    .await?;
                if updated == 0 {
                    return Ok(false);
                }
                diesel::update(complaints::table.filter(complaints::volunteer_id.eq(id)))
                    .set(complaints::volunteer_name.eq(name))
                    .execute(conn)
                    .await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .order((users::points.desc(), users::name.asc(), users::id.asc()))
            .limit(limit)
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(row_to_user)
            .collect::<Result<Vec<_>, _>>()
            .map_err(UserPersistenceError::query)
    }
}
