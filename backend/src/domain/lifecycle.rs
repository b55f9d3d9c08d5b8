//! Complaint lifecycle engine.
//!
//! Pure functions that check whether an actor may move a complaint along
//! `open → in-progress → resolved` (or transfer it back to `open`) and compute
//! the resulting complaint together with its side effects. Nothing here
//! touches storage: the caller commits a [`PlannedTransition`] atomically and
//! uses the expected status and volunteer as a compare-and-swap guard.

use std::fmt;

use chrono::{DateTime, Utc};

use super::{
    Complaint, ComplaintDraft, ComplaintStatus, ComplaintValidationError, Department,
    NotificationDraft, NotificationKind, Role, User, UserId, Volunteer,
};

/// The authenticated user attempting a lifecycle action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    pub department: Option<Department>,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: *user.id(),
            name: user.name().to_string(),
            role: user.role(),
            department: user.department().cloned(),
        }
    }
}

/// State-changing requests a volunteer can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Accept,
    Transfer,
    Resolve,
}

impl Transition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Transfer => "transfer",
            Self::Resolve => "resolve",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a lifecycle action is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The actor's role may never perform this action.
    NotPermitted { role: Role, action: &'static str },
    /// The complaint is not in the status the action starts from.
    InvalidStatus {
        action: &'static str,
        status: ComplaintStatus,
    },
    /// Only the assigned volunteer may transfer or resolve.
    NotAssignedVolunteer,
    /// Students cannot volunteer for their own complaints.
    OwnComplaint,
    /// Technical members only accept complaints in their department.
    DepartmentMismatch { category: String },
    /// Only the student who raised a complaint may edit it.
    NotRaiser,
    /// The computed complaint broke an aggregate invariant.
    Inconsistent(ComplaintValidationError),
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPermitted { role, action } => {
                write!(f, "{role} users may not {action} complaints")
            }
            Self::InvalidStatus { action, status } => {
                write!(f, "cannot {action} a complaint that is {status}")
            }
            Self::NotAssignedVolunteer => {
                write!(f, "only the assigned volunteer may change this complaint")
            }
            Self::OwnComplaint => write!(f, "cannot volunteer for your own complaint"),
            Self::DepartmentMismatch { category } => {
                write!(f, "complaints in category {category} belong to another department")
            }
            Self::NotRaiser => write!(f, "only the student who raised this complaint may edit it"),
            Self::Inconsistent(err) => write!(f, "transition produced an invalid complaint: {err}"),
        }
    }
}

impl std::error::Error for TransitionError {}

/// Points credited to a volunteer as part of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsAward {
    pub user_id: UserId,
    pub points: u32,
}

/// A validated transition ready to be committed.
///
/// `expected_status` and `expected_volunteer` describe the complaint row the
/// plan was computed from; the commit must fail if the stored row differs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTransition {
    pub transition: Transition,
    pub expected_status: ComplaintStatus,
    pub expected_volunteer: Option<UserId>,
    pub complaint: Complaint,
    pub award: Option<PointsAward>,
    pub notification: NotificationDraft,
}

/// Validate `transition` for `actor` and compute its effects.
///
/// Role checks run first, then the status check, then volunteer identity.
///
/// # Examples
/// ```
/// use chrono::{NaiveDate, Utc};
/// use helpdesk::domain::{
///     plan_transition, Actor, Category, Complaint, ComplaintId, ComplaintStatus, Difficulty,
///     NewComplaint, Role, Transition, UserId,
/// };
///
/// let complaint = Complaint::open(
///     ComplaintId::random(),
///     NewComplaint {
///         title: "Broken tap".into(),
///         description: "Leaks all night".into(),
///         category: Category::new("plumbing").expect("valid category"),
///         location: None,
///         difficulty: Difficulty::Medium,
///         emergency: false,
///         fix_till_date: NaiveDate::from_ymd_opt(2026, 1, 10).expect("valid date"),
///     },
///     UserId::random(),
///     Utc::now(),
/// );
/// let volunteer = Actor {
///     id: UserId::random(),
///     name: "Grace".into(),
///     role: Role::Student,
///     department: None,
/// };
/// let plan = plan_transition(&complaint, &volunteer, Transition::Accept, Utc::now())
///     .expect("students may accept open complaints");
/// assert_eq!(plan.complaint.status(), ComplaintStatus::InProgress);
/// assert!(plan.award.is_none());
/// ```
pub fn plan_transition(
    complaint: &Complaint,
    actor: &Actor,
    transition: Transition,
    now: DateTime<Utc>,
) -> Result<PlannedTransition, TransitionError> {
    match transition {
        Transition::Accept => plan_accept(complaint, actor),
        Transition::Transfer => plan_transfer(complaint, actor),
        Transition::Resolve => plan_resolve(complaint, actor, now),
    }
}

fn plan_accept(complaint: &Complaint, actor: &Actor) -> Result<PlannedTransition, TransitionError> {
    check_acceptor(complaint, actor)?;
    require_status(complaint, ComplaintStatus::Open, Transition::Accept.as_str())?;

    let updated = rebuild(complaint, |draft| {
        draft.status = ComplaintStatus::InProgress;
        draft.volunteer = Some(Volunteer {
            id: actor.id,
            name: actor.name.clone(),
        });
    })?;
    let notification = NotificationDraft::generated(
        *complaint.raised_by(),
        NotificationKind::ComplaintAccepted,
        format!(
            "Your complaint \"{}\" was accepted by {}",
            complaint.title(),
            actor.name
        ),
        Some(complaint.id()),
    );
    Ok(PlannedTransition {
        transition: Transition::Accept,
        expected_status: ComplaintStatus::Open,
        expected_volunteer: None,
        complaint: updated,
        award: None,
        notification,
    })
}

fn plan_transfer(
    complaint: &Complaint,
    actor: &Actor,
) -> Result<PlannedTransition, TransitionError> {
    if actor.role != Role::Technical {
        return Err(TransitionError::NotPermitted {
            role: actor.role,
            action: Transition::Transfer.as_str(),
        });
    }
    require_status(
        complaint,
        ComplaintStatus::InProgress,
        Transition::Transfer.as_str(),
    )?;
    require_volunteer(complaint, actor)?;

    let updated = rebuild(complaint, |draft| {
        draft.status = ComplaintStatus::Open;
        draft.volunteer = None;
    })?;
    let notification = NotificationDraft::generated(
        *complaint.raised_by(),
        NotificationKind::ComplaintAccepted,
        format!(
            "Your complaint \"{}\" was transferred back to the open queue by {}",
            complaint.title(),
            actor.name
        ),
        Some(complaint.id()),
    );
    Ok(PlannedTransition {
        transition: Transition::Transfer,
        expected_status: ComplaintStatus::InProgress,
        expected_volunteer: Some(actor.id),
        complaint: updated,
        award: None,
        notification,
    })
}

fn plan_resolve(
    complaint: &Complaint,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<PlannedTransition, TransitionError> {
    require_status(
        complaint,
        ComplaintStatus::InProgress,
        Transition::Resolve.as_str(),
    )?;
    require_volunteer(complaint, actor)?;

    let updated = rebuild(complaint, |draft| {
        draft.status = ComplaintStatus::Resolved;
        draft.resolved_at = Some(now);
    })?;
    let notification = NotificationDraft::generated(
        *complaint.raised_by(),
        NotificationKind::ComplaintResolved,
        format!(
            "Your complaint \"{}\" was resolved by {}",
            complaint.title(),
            actor.name
        ),
        Some(complaint.id()),
    );
    Ok(PlannedTransition {
        transition: Transition::Resolve,
        expected_status: ComplaintStatus::InProgress,
        expected_volunteer: Some(actor.id),
        complaint: updated,
        award: Some(PointsAward {
            user_id: actor.id,
            points: complaint.difficulty().points(),
        }),
        notification,
    })
}

fn check_acceptor(complaint: &Complaint, actor: &Actor) -> Result<(), TransitionError> {
    match actor.role {
        Role::Admin => Err(TransitionError::NotPermitted {
            role: actor.role,
            action: Transition::Accept.as_str(),
        }),
        Role::Student if complaint.raised_by() == &actor.id => Err(TransitionError::OwnComplaint),
        Role::Student => Ok(()),
        Role::Technical => match &actor.department {
            Some(department) if complaint.category().is_handled_by(department) => Ok(()),
            _ => Err(TransitionError::DepartmentMismatch {
                category: complaint.category().to_string(),
            }),
        },
    }
}

fn require_status(
    complaint: &Complaint,
    expected: ComplaintStatus,
    action: &'static str,
) -> Result<(), TransitionError> {
    if complaint.status() == expected {
        Ok(())
    } else {
        Err(TransitionError::InvalidStatus {
            action,
            status: complaint.status(),
        })
    }
}

fn require_volunteer(complaint: &Complaint, actor: &Actor) -> Result<(), TransitionError> {
    if complaint.volunteer_id() == Some(&actor.id) {
        Ok(())
    } else {
        Err(TransitionError::NotAssignedVolunteer)
    }
}

fn rebuild(
    complaint: &Complaint,
    change: impl FnOnce(&mut ComplaintDraft),
) -> Result<Complaint, TransitionError> {
    let mut draft = complaint.clone().into_draft();
    change(&mut draft);
    Complaint::new(draft).map_err(TransitionError::Inconsistent)
}

/// Whether `actor` could accept `complaint` right now.
pub fn can_accept(complaint: &Complaint, actor: &Actor) -> bool {
    complaint.status() == ComplaintStatus::Open && check_acceptor(complaint, actor).is_ok()
}

/// Only students raise complaints.
pub fn authorize_create(actor: &Actor) -> Result<(), TransitionError> {
    if actor.role == Role::Student {
        Ok(())
    } else {
        Err(TransitionError::NotPermitted {
            role: actor.role,
            action: "create",
        })
    }
}

/// Only administrators delete complaints.
pub fn authorize_delete(actor: &Actor) -> Result<(), TransitionError> {
    if actor.role == Role::Admin {
        Ok(())
    } else {
        Err(TransitionError::NotPermitted {
            role: actor.role,
            action: "delete",
        })
    }
}

/// The raiser may edit descriptive fields while the complaint is open.
pub fn authorize_edit(complaint: &Complaint, actor: &Actor) -> Result<(), TransitionError> {
    if complaint.raised_by() != &actor.id {
        return Err(TransitionError::NotRaiser);
    }
    require_status(complaint, ComplaintStatus::Open, "edit")
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
