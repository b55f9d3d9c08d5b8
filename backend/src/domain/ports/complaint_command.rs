//! Driving ports for complaint lifecycle use-cases.
//!
//! Inbound adapters pass the authenticated user id; services resolve the
//! actor server-side and enforce every lifecycle guard before touching the
//! store.

use async_trait::async_trait;

use crate::domain::{
    Complaint, ComplaintEdit, ComplaintFilter, ComplaintId, ComplaintSubmission, Error,
    Transition, UserId,
};

/// Driving port for complaint mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ComplaintCommand: Send + Sync {
    /// Open a complaint raised by `actor`, who must be a student.
    async fn create(
        &self,
        actor: &UserId,
        submission: ComplaintSubmission,
    ) -> Result<Complaint, Error>;

    /// Apply an accept, transfer or resolve request.
    ///
    /// Lost races against a concurrent transition surface as
    /// [`crate::domain::ErrorCode::Conflict`].
    async fn transition(
        &self,
        actor: &UserId,
        complaint_id: &ComplaintId,
        transition: Transition,
    ) -> Result<Complaint, Error>;

    /// Edit descriptive fields of an open complaint raised by `actor`.
    async fn edit(
        &self,
        actor: &UserId,
        complaint_id: &ComplaintId,
        edit: ComplaintEdit,
    ) -> Result<Complaint, Error>;

    /// Delete a complaint; administrators only.
    async fn delete(&self, actor: &UserId, complaint_id: &ComplaintId) -> Result<(), Error>;
}

/// Driving port for complaint reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ComplaintQuery: Send + Sync {
    async fn get(&self, actor: &UserId, complaint_id: &ComplaintId) -> Result<Complaint, Error>;

    /// Filtered list, newest first.
    async fn list(&self, actor: &UserId, filter: ComplaintFilter) -> Result<Vec<Complaint>, Error>;

    /// Open complaints `actor` may accept, emergencies first, then by due
    /// date.
    async fn queue(&self, actor: &UserId) -> Result<Vec<Complaint>, Error>;
}
