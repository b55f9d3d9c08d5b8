//! PostgreSQL-backed `ComplaintRepository` implementation.
//!
//! Lifecycle commits run in one transaction: a compare-and-swap update of the
//! complaint row, an atomic `points = points + delta` increment, and the
//! notification insert. A guard mismatch rolls everything back.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{ComplaintRepository, ComplaintRepositoryError};
use crate::domain::{
    Category, Complaint, ComplaintDraft, ComplaintFilter, ComplaintId, ComplaintStatus,
    Difficulty, Notification, PlannedTransition, UserId, Volunteer,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_notification_repository::notification_row;
use super::models::{
    ComplaintDetailsUpdate, ComplaintLifecycleUpdate, ComplaintRow, NewComplaintRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{complaints, notifications, users};

/// Diesel-backed implementation of the complaint repository port.
#[derive(Clone)]
pub struct DieselComplaintRepository {
    pool: DbPool,
}

impl DieselComplaintRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ComplaintRepositoryError {
    map_basic_pool_error(error, ComplaintRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ComplaintRepositoryError {
    map_basic_diesel_error(
        error,
        ComplaintRepositoryError::query,
        ComplaintRepositoryError::connection,
    )
}

/// Failures inside a guarded write transaction.
#[derive(Debug)]
enum GuardedWriteError {
    Diesel(diesel::result::Error),
    Conflict,
    Missing,
    Query(String),
}

impl From<diesel::result::Error> for GuardedWriteError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

impl GuardedWriteError {
    fn into_repository_error(self, id: ComplaintId) -> ComplaintRepositoryError {
        match self {
            Self::Diesel(error) => map_diesel_error(error),
            Self::Conflict => ComplaintRepositoryError::conflict(id.to_string()),
            Self::Missing => ComplaintRepositoryError::not_found(id.to_string()),
            Self::Query(message) => ComplaintRepositoryError::query(message),
        }
    }
}

/// Unrecognised stored difficulty labels are read as the lowest tier so they
/// award the default points.
fn stored_difficulty(id: Uuid, label: &str) -> Difficulty {
    label.parse().unwrap_or_else(|_| {
        warn!(complaint_id = %id, label, "unknown stored difficulty; using easy");
        Difficulty::Easy
    })
}

fn row_to_complaint(row: ComplaintRow) -> Result<Complaint, ComplaintRepositoryError> {
    let ComplaintRow {
        id,
        title,
        description,
        category,
        location,
        difficulty,
        emergency,
        status,
        raised_by,
        volunteer_id,
        volunteer_name,
        fix_till_date,
        created_at,
        resolved_at,
    } = row;
    let query = |err: crate::domain::ComplaintValidationError| {
        ComplaintRepositoryError::query(format!("stored complaint {id} is invalid: {err}"))
    };
    let volunteer = volunteer_id.map(|volunteer| Volunteer {
        id: UserId::from_uuid(volunteer),
        name: volunteer_name.unwrap_or_default(),
    });
    Complaint::new(ComplaintDraft {
        id: ComplaintId::from_uuid(id),
        title,
        description,
        category: Category::new(category).map_err(query)?,
        location,
        difficulty: stored_difficulty(id, &difficulty),
        emergency,
        status: status.parse().map_err(query)?,
        raised_by: UserId::from_uuid(raised_by),
        volunteer,
        fix_till_date,
        created_at,
        resolved_at,
    })
    .map_err(query)
}

fn lifecycle_update(complaint: &Complaint) -> ComplaintLifecycleUpdate<'_> {
    ComplaintLifecycleUpdate {
        status: complaint.status().as_str(),
        volunteer_id: complaint.volunteer_id().map(|id| *id.as_uuid()),
        volunteer_name: complaint.volunteer().map(|volunteer| volunteer.name.as_str()),
        resolved_at: complaint.resolved_at(),
    }
}

#[async_trait]
impl ComplaintRepository for DieselComplaintRepository {
    async fn insert(&self, complaint: &Complaint) -> Result<(), ComplaintRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewComplaintRow {
            id: *complaint.id().as_uuid(),
            title: complaint.title(),
            description: complaint.description(),
            category: complaint.category().as_ref(),
            location: complaint.location(),
            difficulty: complaint.difficulty().as_str(),
            emergency: complaint.is_emergency(),
            status: complaint.status().as_str(),
            raised_by: *complaint.raised_by().as_uuid(),
            volunteer_id: complaint.volunteer_id().map(|id| *id.as_uuid()),
            volunteer_name: complaint.volunteer().map(|v| v.name.as_str()),
            fix_till_date: complaint.fix_till_date(),
            created_at: complaint.created_at(),
            resolved_at: complaint.resolved_at(),
        };
        diesel::insert_into(complaints::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(
        &self,
        id: &ComplaintId,
    ) -> Result<Option<Complaint>, ComplaintRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = complaints::table
            .find(id.as_uuid())
            .select(ComplaintRow::as_select())
            .first::<ComplaintRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_complaint).transpose()
    }

    async fn list(
        &self,
        filter: &ComplaintFilter,
    ) -> Result<Vec<Complaint>, ComplaintRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = complaints::table
            .select(ComplaintRow::as_select())
            .order((complaints::created_at.desc(), complaints::id.asc()))
            .into_boxed();
        if let Some(raised_by) = &filter.raised_by {
            query = query.filter(complaints::raised_by.eq(*raised_by.as_uuid()));
        }
        if let Some(status) = filter.status {
            query = query.filter(complaints::status.eq(status.as_str()));
        }
        if let Some(category) = &filter.category {
            query = query.filter(complaints::category.eq(category.as_ref().to_owned()));
        }
        if let Some(volunteer) = &filter.volunteer_id {
            query = query.filter(complaints::volunteer_id.eq(*volunteer.as_uuid()));
        }
        let rows: Vec<ComplaintRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_complaint).collect()
    }

    async fn commit_transition(
        &self,
        plan: &PlannedTransition,
        notification: &Notification,
    ) -> Result<(), ComplaintRepositoryError> {
        let complaint_id = plan.complaint.id();
        let id = *complaint_id.as_uuid();
        let expected_status = plan.expected_status.as_str();
        let expected_volunteer = plan.expected_volunteer.map(|user| *user.as_uuid());
        let changes = lifecycle_update(&plan.complaint);
        let award = plan.award;
        let note = notification_row(notification);

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, GuardedWriteError, _>(|conn| {
            async move {
                let updated = diesel::update(
                    complaints::table
                        .filter(complaints::id.eq(id))
                        .filter(complaints::status.eq(expected_status))
                        .filter(complaints::volunteer_id.is_not_distinct_from(expected_volunteer)),
                )
                .set(&changes)
                .execute(conn)
                .await?;
                if updated == 0 {
                    let exists = complaints::table
                        .find(id)
                        .select(complaints::id)
                        .first::<Uuid>(conn)
                        .await
                        .optional()?
                        .is_some();
                    return Err(if exists {
                        GuardedWriteError::Conflict
                    } else {
                        GuardedWriteError::Missing
                    });
                }

                if let Some(award) = award {
                    let delta = i32::try_from(award.points).map_err(|_| {
                        GuardedWriteError::Query(format!("award too large: {}", award.points))
                    })?;
                    let credited = diesel::update(users::table.find(*award.user_id.as_uuid()))
                        .set(users::points.eq(users::points + delta))
                        .execute(conn)
                        .await?;
                    if credited == 0 {
                        return Err(GuardedWriteError::Query(format!(
                            "volunteer {} no longer exists",
                            award.user_id
                        )));
                    }
                }

                diesel::insert_into(notifications::table)
                    .values(&note)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| err.into_repository_error(complaint_id))
    }

    async fn update_details(
        &self,
        complaint: &Complaint,
        expected_status: ComplaintStatus,
    ) -> Result<(), ComplaintRepositoryError> {
        let complaint_id = complaint.id();
        let id = *complaint_id.as_uuid();
        let changes = ComplaintDetailsUpdate {
            title: complaint.title(),
            description: complaint.description(),
            location: complaint.location(),
            emergency: complaint.is_emergency(),
            fix_till_date: complaint.fix_till_date(),
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, GuardedWriteError, _>(|conn| {
            async move {
                let updated = diesel::update(
                    complaints::table
                        .filter(complaints::id.eq(id))
                        .filter(complaints::status.eq(expected_status.as_str())),
                )
                .set(&changes)
                .execute(conn)
                .await?;
                if updated > 0 {
                    return Ok(());
                }
                let exists = complaints::table
                    .find(id)
                    .select(complaints::id)
                    .first::<Uuid>(conn)
                    .await
                    .optional()?
                    .is_some();
                Err(if exists {
                    GuardedWriteError::Conflict
                } else {
                    GuardedWriteError::Missing
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| err.into_repository_error(complaint_id))
    }

    async fn delete(&self, id: &ComplaintId) -> Result<bool, ComplaintRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(complaints::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion and guard error mapping coverage.
    use chrono::{NaiveDate, TimeZone, Utc};
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn row() -> ComplaintRow {
        ComplaintRow {
            id: Uuid::new_v4(),
            title: "Broken heater".to_owned(),
            description: "Room 12 is freezing".to_owned(),
            category: "electrical".to_owned(),
            location: Some("Hall B".to_owned()),
            difficulty: "medium".to_owned(),
            emergency: true,
            status: "open".to_owned(),
            raised_by: Uuid::new_v4(),
            volunteer_id: None,
            volunteer_name: None,
            fix_till_date: NaiveDate::from_ymd_opt(2026, 2, 1).expect("valid date"),
            created_at: Utc
                .with_ymd_and_hms(2026, 1, 20, 8, 0, 0)
                .single()
                .expect("valid timestamp"),
            resolved_at: None,
        }
    }

    #[rstest]
    fn open_row_converts(row: ComplaintRow) {
        let complaint = row_to_complaint(row).expect("valid row");
        assert_eq!(complaint.status(), ComplaintStatus::Open);
        assert_eq!(complaint.difficulty(), Difficulty::Medium);
        assert!(complaint.is_emergency());
    }

    #[rstest]
    fn unknown_difficulty_reads_as_easy(mut row: ComplaintRow) {
        row.difficulty = "legendary".to_owned();
        let complaint = row_to_complaint(row).expect("valid row");
        assert_eq!(complaint.difficulty().points(), 10);
    }

    #[rstest]
    fn in_progress_row_without_volunteer_is_rejected(mut row: ComplaintRow) {
        row.status = "in-progress".to_owned();
        let error = row_to_complaint(row).expect_err("invariant violated");
        assert!(matches!(error, ComplaintRepositoryError::Query { .. }));
    }

    #[rstest]
    fn unknown_status_is_rejected(mut row: ComplaintRow) {
        row.status = "archived".to_owned();
        assert!(row_to_complaint(row).is_err());
    }

    #[rstest]
    #[case(GuardedWriteError::Conflict, "modified concurrently")]
    #[case(GuardedWriteError::Missing, "not found")]
    fn guard_failures_name_the_complaint(
        #[case] failure: GuardedWriteError,
        #[case] expected: &str,
    ) {
        let id = ComplaintId::random();
        let error = failure.into_repository_error(id);
        let text = error.to_string();
        assert!(text.contains(expected));
        assert!(text.contains(&id.to_string()));
    }

    #[rstest]
    fn lifecycle_update_clears_volunteer_on_open(row: ComplaintRow) {
        let complaint = row_to_complaint(row).expect("valid row");
        let update = lifecycle_update(&complaint);
        assert_eq!(update.status, "open");
        assert!(update.volunteer_id.is_none());
        assert!(update.resolved_at.is_none());
    }
}
