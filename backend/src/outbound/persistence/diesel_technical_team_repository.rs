//! PostgreSQL-backed `TechnicalTeamRepository` implementation.
//!
//! Roster rows live in `technical_team` and join onto `users` for the name
//! and department.

use async_trait::async_trait;
use diesel::dsl::not;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{TechnicalTeamRepository, TechnicalTeamRepositoryError};
use crate::domain::{PasswordDigest, TechnicalMember, User, UserId};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::diesel_user_repository::{new_user_row, row_to_user};
use super::models::{TechnicalTeamRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{technical_team, users};

/// Diesel-backed implementation of the technical team repository port.
#[derive(Clone)]
pub struct DieselTechnicalTeamRepository {
    pool: DbPool,
}

impl DieselTechnicalTeamRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TechnicalTeamRepositoryError {
    map_basic_pool_error(error, TechnicalTeamRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> TechnicalTeamRepositoryError {
    map_basic_diesel_error(
        error,
        TechnicalTeamRepositoryError::query,
        TechnicalTeamRepositoryError::connection,
    )
}

fn row_to_member(
    user: UserRow,
    available: bool,
) -> Result<TechnicalMember, TechnicalTeamRepositoryError> {
    let id = user.id;
    let user = row_to_user(user).map_err(TechnicalTeamRepositoryError::query)?;
    let department = user.department().cloned().ok_or_else(|| {
        TechnicalTeamRepositoryError::query(format!("roster user {id} has no department"))
    })?;
    Ok(TechnicalMember {
        user_id: *user.id(),
        name: user.name().clone(),
        department,
        available,
    })
}

#[async_trait]
impl TechnicalTeamRepository for DieselTechnicalTeamRepository {
    async fn create_member(
        &self,
        user: &User,
        digest: &PasswordDigest,
        available: bool,
    ) -> Result<TechnicalMember, TechnicalTeamRepositoryError> {
        let department = user.department().cloned().ok_or_else(|| {
            TechnicalTeamRepositoryError::query("technical members need a department")
        })?;
        let account = new_user_row(user, digest);
        let roster = TechnicalTeamRow {
            user_id: *user.id().as_uuid(),
            available,
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                diesel::insert_into(users::table)
                    .values(&account)
                    .execute(conn)
                    .await?;
                diesel::insert_into(technical_team::table)
                    .values(&roster)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                TechnicalTeamRepositoryError::duplicate_email(user.email().as_ref())
            } else {
                map_diesel_error(err)
            }
        })?;

        Ok(TechnicalMember {
            user_id: *user.id(),
            name: user.name().clone(),
            department,
            available,
        })
    }

    async fn list(&self) -> Result<Vec<TechnicalMember>, TechnicalTeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(UserRow, bool)> = technical_team::table
            .inner_join(users::table)
            .order((users::department.asc(), users::name.asc(), users::id.asc()))
            .select((UserRow::as_select(), technical_team::available))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|(user, available)| row_to_member(user, available))
            .collect()
    }

    async fn toggle_availability(
        &self,
        user_id: &UserId,
    ) -> Result<Option<TechnicalMember>, TechnicalTeamRepositoryError> {
        let id = *user_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let toggled = diesel::update(technical_team::table.find(id))
                        .set(technical_team::available.eq(not(technical_team::available)))
                        .returning(technical_team::available)
                        .get_result::<bool>(conn)
                        .await
                        .optional()?;
                    let Some(available) = toggled else {
                        return Ok(None);
                    };
                    let user = users::table
                        .find(id)
                        .select(UserRow::as_select())
                        .first::<UserRow>(conn)
                        .await?;
                    Ok(Some((user, available)))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        row.map(|(user, available)| row_to_member(user, available))
            .transpose()
    }
}
