//! Technical team roster administration.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    NewTechnicalMember, Registration, TechnicalTeamAdmin, TechnicalTeamRepository,
    TechnicalTeamRepositoryError, UserRepository,
};
use crate::domain::user_account_service::{digest_password, load_session_user};
use crate::domain::{Error, Retrier, Role, TechnicalMember, User, UserDraft, UserId};

fn map_team_error(error: TechnicalTeamRepositoryError) -> Error {
    match error {
        TechnicalTeamRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("technical team repository unavailable: {message}"))
        }
        TechnicalTeamRepositoryError::Query { message } => {
            Error::internal(format!("technical team repository error: {message}"))
        }
        TechnicalTeamRepositoryError::DuplicateEmail { email } => {
            Error::conflict("email already registered")
                .with_details(json!({ "field": "email", "value": email }))
        }
    }
}

/// Roster service implementing [`TechnicalTeamAdmin`].
#[derive(Clone)]
pub struct TechnicalTeamService<T, U> {
    team: Arc<T>,
    users: Arc<U>,
    retrier: Retrier,
}

impl<T, U> TechnicalTeamService<T, U> {
    pub fn new(team: Arc<T>, users: Arc<U>, retrier: Retrier) -> Self {
        Self {
            team,
            users,
            retrier,
        }
    }
}

impl<T, U> TechnicalTeamService<T, U>
where
    T: TechnicalTeamRepository,
    U: UserRepository,
{
    async fn require_admin(&self, actor: &UserId) -> Result<(), Error> {
        let user = load_session_user(self.users.as_ref(), &self.retrier, actor).await?;
        if user.role() == Role::Admin {
            Ok(())
        } else {
            Err(Error::forbidden("only administrators manage the technical team"))
        }
    }
}

#[async_trait]
impl<T, U> TechnicalTeamAdmin for TechnicalTeamService<T, U>
where
    T: TechnicalTeamRepository,
    U: UserRepository,
{
    async fn list(&self) -> Result<Vec<TechnicalMember>, Error> {
        let team = self.team.as_ref();
        self.retrier
            .run("technical_team.list", || async move {
                team.list().await.map_err(map_team_error)
            })
            .await
    }

    async fn add_member(
        &self,
        actor: &UserId,
        member: NewTechnicalMember,
    ) -> Result<TechnicalMember, Error> {
        self.require_admin(actor).await?;
        let NewTechnicalMember {
            account:
                Registration {
                    name,
                    email,
                    password,
                },
            department,
        } = member;
        let user = User::new(UserDraft {
            id: UserId::random(),
            name,
            email,
            role: Role::Technical,
            department: Some(department),
            points: 0,
        })
        .map_err(|err| Error::invalid_request(err.to_string()))?;
        let digest = digest_password(&password)?;

        let team = self.team.as_ref();
        let (account, digest) = (&user, &digest);
        let created = self
            .retrier
            .run("technical_team.create_member", || async move {
                team.create_member(account, digest, true)
                    .await
                    .map_err(map_team_error)
            })
            .await?;
        info!(user_id = %created.user_id, department = %created.department, "technical member added");
        Ok(created)
    }

    async fn toggle_availability(
        &self,
        actor: &UserId,
        member: &UserId,
    ) -> Result<TechnicalMember, Error> {
        self.require_admin(actor).await?;
        let team = self.team.as_ref();
        self.retrier
            .run("technical_team.toggle_availability", || async move {
                team.toggle_availability(member)
                    .await
                    .map_err(map_team_error)
            })
            .await?
            .ok_or_else(|| Error::not_found(format!("technical member {member} not found")))
    }
}
