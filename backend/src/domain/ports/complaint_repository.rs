//! Port for complaint persistence and atomic lifecycle commits.

use async_trait::async_trait;

use crate::domain::{
    Complaint, ComplaintFilter, ComplaintId, ComplaintStatus, Notification, PlannedTransition,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by complaint repository adapters.
    pub enum ComplaintRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "complaint repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "complaint repository query failed: {message}",
        /// The stored complaint no longer matches the state a change was
        /// computed from.
        Conflict { complaint_id: String } =>
            "complaint {complaint_id} was modified concurrently",
        /// The complaint does not exist.
        NotFound { complaint_id: String } =>
            "complaint {complaint_id} not found",
    }
}

/// Port for reading complaints and committing lifecycle transitions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ComplaintRepository: Send + Sync {
    /// Insert a newly opened complaint.
    async fn insert(&self, complaint: &Complaint) -> Result<(), ComplaintRepositoryError>;

    /// Find a complaint by id.
    async fn find_by_id(
        &self,
        id: &ComplaintId,
    ) -> Result<Option<Complaint>, ComplaintRepositoryError>;

    /// List complaints matching `filter`, newest first.
    async fn list(&self, filter: &ComplaintFilter)
    -> Result<Vec<Complaint>, ComplaintRepositoryError>;

    /// Commit a planned transition in one transaction:
    ///
    /// 1. update the complaint row only if its status and volunteer still
    ///    equal `plan.expected_status` and `plan.expected_volunteer`;
    /// 2. add the points award, if any, with a single atomic increment;
    /// 3. insert `notification`.
    ///
    /// Any failure leaves all rows untouched. A guard mismatch yields
    /// [`ComplaintRepositoryError::Conflict`].
    async fn commit_transition(
        &self,
        plan: &PlannedTransition,
        notification: &Notification,
    ) -> Result<(), ComplaintRepositoryError>;

    /// Persist descriptive edits if the stored status still equals
    /// `expected_status`.
    async fn update_details(
        &self,
        complaint: &Complaint,
        expected_status: ComplaintStatus,
    ) -> Result<(), ComplaintRepositoryError>;

    /// Delete a complaint. Returns `false` when nothing was deleted.
    async fn delete(&self, id: &ComplaintId) -> Result<bool, ComplaintRepositoryError>;
}
