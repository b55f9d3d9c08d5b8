//! Complaint use-cases: creation, lifecycle transitions, edits and queries.
//!
//! The service resolves the acting user from storage, asks the lifecycle
//! engine for a [`PlannedTransition`], and hands the plan to the repository
//! to commit atomically. A commit that loses a race surfaces as `conflict`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{
    ComplaintCommand, ComplaintQuery, ComplaintRepository, ComplaintRepositoryError,
    UserRepository,
};
use crate::domain::user_account_service::load_session_user;
use crate::domain::{
    Actor, Complaint, ComplaintEdit, ComplaintFilter, ComplaintId, ComplaintStatus,
    ComplaintSubmission, ComplaintValidationError, Error, ErrorCode, NewComplaint, Notification,
    NotificationId, PlannedTransition, Retrier, Transition, TransitionError, UserId, authorize_create,
    authorize_delete, authorize_edit, can_accept, plan_transition, sort_for_volunteers,
};

pub(crate) fn map_complaint_error(error: ComplaintRepositoryError) -> Error {
    match error {
        ComplaintRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("complaint repository unavailable: {message}"))
        }
        ComplaintRepositoryError::Query { message } => {
            Error::internal(format!("complaint repository error: {message}"))
        }
        ComplaintRepositoryError::Conflict { complaint_id } => {
            Error::conflict("complaint was changed by another request")
                .with_details(json!({ "complaintId": complaint_id }))
        }
        ComplaintRepositoryError::NotFound { complaint_id } => {
            Error::not_found(format!("complaint {complaint_id} not found"))
        }
    }
}

pub(crate) fn map_transition_error(error: TransitionError) -> Error {
    match error {
        TransitionError::InvalidStatus { .. } => Error::conflict(error.to_string()),
        TransitionError::Inconsistent(_) => Error::internal(error.to_string()),
        TransitionError::NotPermitted { .. }
        | TransitionError::NotAssignedVolunteer
        | TransitionError::OwnComplaint
        | TransitionError::DepartmentMismatch { .. }
        | TransitionError::NotRaiser => Error::forbidden(error.to_string()),
    }
}

fn map_validation_error(error: ComplaintValidationError) -> Error {
    let field = match &error {
        ComplaintValidationError::MissingField { field }
        | ComplaintValidationError::FieldTooLong { field, .. } => Some(*field),
        ComplaintValidationError::UnknownDifficulty(_) => Some("difficulty"),
        ComplaintValidationError::UnknownStatus(_) => Some("status"),
        _ => None,
    };
    let base = Error::invalid_request(error.to_string());
    match field {
        Some(field) => base.with_details(json!({ "field": field })),
        None => base,
    }
}

/// Complaint service implementing [`ComplaintCommand`] and [`ComplaintQuery`].
#[derive(Clone)]
pub struct ComplaintService<C, U> {
    complaints: Arc<C>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
    retrier: Retrier,
}

impl<C, U> ComplaintService<C, U> {
    pub fn new(
        complaints: Arc<C>,
        users: Arc<U>,
        clock: Arc<dyn Clock>,
        retrier: Retrier,
    ) -> Self {
        Self {
            complaints,
            users,
            clock,
            retrier,
        }
    }
}

impl<C, U> ComplaintService<C, U>
where
    C: ComplaintRepository,
    U: UserRepository,
{
    async fn actor(&self, user_id: &UserId) -> Result<Actor, Error> {
        let user = load_session_user(self.users.as_ref(), &self.retrier, user_id).await?;
        Ok(Actor::from(&user))
    }

    async fn load(&self, complaint_id: &ComplaintId) -> Result<Complaint, Error> {
        let complaints = self.complaints.as_ref();
        self.retrier
            .run("complaints.find_by_id", || async move {
                complaints
                    .find_by_id(complaint_id)
                    .await
                    .map_err(map_complaint_error)
            })
            .await?
            .ok_or_else(|| Error::not_found(format!("complaint {complaint_id} not found")))
    }

    /// Decide whether a conflict seen on a retried commit is our own earlier
    /// attempt, whose COMMIT landed before the connection dropped.
    async fn confirm_committed(
        &self,
        plan: &PlannedTransition,
        conflict: Error,
    ) -> Result<(), Error> {
        let stored = self.load(&plan.complaint.id()).await?;
        let landed = stored.status() == plan.complaint.status()
            && stored.volunteer_id() == plan.complaint.volunteer_id()
            && stored.resolved_at() == plan.complaint.resolved_at();
        if !landed {
            return Err(conflict);
        }
        warn!(
            complaint_id = %plan.complaint.id(),
            "retried transition found its earlier attempt already committed"
        );
        Ok(())
    }

    async fn fetch(&self, filter: &ComplaintFilter) -> Result<Vec<Complaint>, Error> {
        let complaints = self.complaints.as_ref();
        self.retrier
            .run("complaints.list", || async move {
                complaints.list(filter).await.map_err(map_complaint_error)
            })
            .await
    }
}

#[async_trait]
impl<C, U> ComplaintCommand for ComplaintService<C, U>
where
    C: ComplaintRepository,
    U: UserRepository,
{
    async fn create(
        &self,
        actor: &UserId,
        submission: ComplaintSubmission,
    ) -> Result<Complaint, Error> {
        let actor = self.actor(actor).await?;
        authorize_create(&actor).map_err(map_transition_error)?;
        let fields = NewComplaint::try_from(submission).map_err(map_validation_error)?;
        let complaint = Complaint::open(ComplaintId::random(), fields, actor.id, self.clock.utc());

        let complaints = self.complaints.as_ref();
        let candidate = &complaint;
        self.retrier
            .run("complaints.insert", || async move {
                complaints
                    .insert(candidate)
                    .await
                    .map_err(map_complaint_error)
            })
            .await?;
        info!(complaint_id = %complaint.id(), raised_by = %actor.id, "complaint opened");
        Ok(complaint)
    }

    async fn transition(
        &self,
        actor: &UserId,
        complaint_id: &ComplaintId,
        transition: Transition,
    ) -> Result<Complaint, Error> {
        let actor = self.actor(actor).await?;
        let complaint = self.load(complaint_id).await?;
        let now = self.clock.utc();
        let plan = plan_transition(&complaint, &actor, transition, now)
            .map_err(map_transition_error)?;
        let notification =
            Notification::from_draft(NotificationId::random(), plan.notification.clone(), now);

        let complaints = self.complaints.as_ref();
        let (planned, note) = (&plan, &notification);
        let attempts = AtomicU32::new(0);
        let committed = self
            .retrier
            .run("complaints.commit_transition", || {
                attempts.fetch_add(1, Ordering::Relaxed);
                async move {
                    complaints
                        .commit_transition(planned, note)
                        .await
                        .map_err(map_complaint_error)
                }
            })
            .await;
        match committed {
            Ok(()) => {}
            Err(conflict)
                if conflict.code() == ErrorCode::Conflict
                    && attempts.load(Ordering::Relaxed) > 1 =>
            {
                self.confirm_committed(&plan, conflict).await?;
            }
            Err(error) => return Err(error),
        }
        info!(
            complaint_id = %complaint_id,
            actor = %actor.id,
            transition = %transition,
            points = plan.award.map_or(0, |award| award.points),
            "complaint transition committed"
        );
        Ok(plan.complaint)
    }

    async fn edit(
        &self,
        actor: &UserId,
        complaint_id: &ComplaintId,
        edit: ComplaintEdit,
    ) -> Result<Complaint, Error> {
        let edit = edit.validate().map_err(map_validation_error)?;
        let actor = self.actor(actor).await?;
        let complaint = self.load(complaint_id).await?;
        authorize_edit(&complaint, &actor).map_err(map_transition_error)?;
        let updated = complaint.with_edit(edit);

        let complaints = self.complaints.as_ref();
        let candidate = &updated;
        self.retrier
            .run("complaints.update_details", || async move {
                complaints
                    .update_details(candidate, ComplaintStatus::Open)
                    .await
                    .map_err(map_complaint_error)
            })
            .await?;
        Ok(updated)
    }

    async fn delete(&self, actor: &UserId, complaint_id: &ComplaintId) -> Result<(), Error> {
        let actor = self.actor(actor).await?;
        authorize_delete(&actor).map_err(map_transition_error)?;

        let complaints = self.complaints.as_ref();
        let deleted = self
            .retrier
            .run("complaints.delete", || async move {
                complaints
                    .delete(complaint_id)
                    .await
                    .map_err(map_complaint_error)
            })
            .await?;
        if !deleted {
            return Err(Error::not_found(format!(
                "complaint {complaint_id} not found"
            )));
        }
        info!(complaint_id = %complaint_id, actor = %actor.id, "complaint deleted");
        Ok(())
    }
}

#[async_trait]
impl<C, U> ComplaintQuery for ComplaintService<C, U>
where
    C: ComplaintRepository,
    U: UserRepository,
{
    async fn get(&self, actor: &UserId, complaint_id: &ComplaintId) -> Result<Complaint, Error> {
        self.actor(actor).await?;
        self.load(complaint_id).await
    }

    async fn list(&self, actor: &UserId, filter: ComplaintFilter) -> Result<Vec<Complaint>, Error> {
        self.actor(actor).await?;
        self.fetch(&filter).await
    }

    async fn queue(&self, actor: &UserId) -> Result<Vec<Complaint>, Error> {
        let actor = self.actor(actor).await?;
        let filter = ComplaintFilter {
            status: Some(ComplaintStatus::Open),
            ..ComplaintFilter::default()
        };
        let mut open: Vec<Complaint> = self
            .fetch(&filter)
            .await?
            .into_iter()
            .filter(|complaint| can_accept(complaint, &actor))
            .collect();
        sort_for_volunteers(&mut open);
        Ok(open)
    }
}

#[cfg(test)]
#[path = "complaint_service_tests.rs"]
mod tests;
