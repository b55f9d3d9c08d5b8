//! Complaint aggregate and its value types.
//!
//! A [`Complaint`] can only be built through [`Complaint::new`], which checks
//! the volunteer and resolution invariants against the status. Lifecycle
//! transitions rebuild the aggregate through the same constructor, so an
//! inconsistent complaint is unrepresentable.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Department, UserId};

/// Maximum title length in characters.
pub const TITLE_MAX: usize = 120;
/// Maximum description length in characters.
pub const DESCRIPTION_MAX: usize = 4000;
/// Maximum location length in characters.
pub const LOCATION_MAX: usize = 120;
/// Maximum category length in characters.
pub const CATEGORY_MAX: usize = 64;

/// Points awarded when the stored difficulty label is not recognised.
pub const DEFAULT_POINTS: u32 = 10;

/// Validation failures for complaint values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComplaintValidationError {
    MissingField { field: &'static str },
    FieldTooLong { field: &'static str, max: usize },
    UnknownDifficulty(String),
    UnknownStatus(String),
    VolunteerMismatch { status: ComplaintStatus },
    ResolvedAtMismatch { status: ComplaintStatus },
    EmptyEdit,
}

impl fmt::Display for ComplaintValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "{field} is required"),
            Self::FieldTooLong { field, max } => {
                write!(f, "{field} must be at most {max} characters")
            }
            Self::UnknownDifficulty(value) => write!(f, "unknown difficulty: {value}"),
            Self::UnknownStatus(value) => write!(f, "unknown status: {value}"),
            Self::VolunteerMismatch { status } => write!(
                f,
                "a {status} complaint must {}have a volunteer",
                if status.expects_volunteer() { "" } else { "not " }
            ),
            Self::ResolvedAtMismatch { status } => write!(
                f,
                "a {status} complaint must {}have a resolution time",
                if *status == ComplaintStatus::Resolved { "" } else { "not " }
            ),
            Self::EmptyEdit => write!(f, "edit must change at least one field"),
        }
    }
}

impl std::error::Error for ComplaintValidationError {}

/// Stable complaint identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComplaintId(Uuid);

impl ComplaintId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ComplaintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Complaint category, normalised to lowercase.
///
/// The special category `other` can be accepted by any technical member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category(String);

const OTHER_CATEGORY: &str = "other";

impl Category {
    /// Validate and normalise a category label.
    pub fn new(label: impl AsRef<str>) -> Result<Self, ComplaintValidationError> {
        let normalised = label.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            return Err(ComplaintValidationError::MissingField { field: "category" });
        }
        if normalised.chars().count() > CATEGORY_MAX {
            return Err(ComplaintValidationError::FieldTooLong {
                field: "category",
                max: CATEGORY_MAX,
            });
        }
        Ok(Self(normalised))
    }

    /// Whether this is the catch-all category.
    pub fn is_other(&self) -> bool {
        self.0 == OTHER_CATEGORY
    }

    /// Whether a technical member of `department` may pick this complaint up.
    pub fn is_handled_by(&self, department: &Department) -> bool {
        self.is_other() || self.0 == department.as_ref()
    }
}

impl AsRef<str> for Category {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Effort rating that fixes the points awarded on resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Points awarded to the volunteer who resolves a complaint.
    ///
    /// # Examples
    /// ```
    /// use helpdesk::domain::Difficulty;
    ///
    /// assert_eq!(Difficulty::Easy.points(), 10);
    /// assert_eq!(Difficulty::Medium.points(), 25);
    /// assert_eq!(Difficulty::Hard.points(), 50);
    /// ```
    pub fn points(self) -> u32 {
        match self {
            Self::Easy => 10,
            Self::Medium => 25,
            Self::Hard => 50,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ComplaintValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(ComplaintValidationError::UnknownDifficulty(s.to_owned())),
        }
    }
}

/// Points for a raw difficulty label; unrecognised labels earn
/// [`DEFAULT_POINTS`].
///
/// # Examples
/// ```
/// use helpdesk::domain::points_for;
///
/// assert_eq!(points_for("hard"), 50);
/// assert_eq!(points_for("legendary"), 10);
/// ```
pub fn points_for(label: &str) -> u32 {
    label
        .parse::<Difficulty>()
        .map_or(DEFAULT_POINTS, Difficulty::points)
}

/// Lifecycle status.
///
/// `Closed` is a reserved storage value: it parses and round-trips but no
/// transition produces or consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ComplaintStatus {
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "resolved")]
    Resolved,
    #[serde(rename = "closed")]
    Closed,
}

impl ComplaintStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in-progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Whether complaints in this status carry a volunteer.
    pub fn expects_volunteer(self) -> bool {
        matches!(self, Self::InProgress | Self::Resolved)
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplaintStatus {
    type Err = ComplaintValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "in-progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            other => Err(ComplaintValidationError::UnknownStatus(other.to_owned())),
        }
    }
}

/// The user currently responsible for a complaint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volunteer {
    pub id: UserId,
    pub name: String,
}

/// All components of a complaint, before invariant checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintDraft {
    pub id: ComplaintId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub location: Option<String>,
    pub difficulty: Difficulty,
    pub emergency: bool,
    pub status: ComplaintStatus,
    pub raised_by: UserId,
    pub volunteer: Option<Volunteer>,
    pub fix_till_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// A reported facility or service issue.
///
/// ## Invariants
/// - `volunteer` is set if and only if `status` is in-progress or resolved.
/// - `resolved_at` is set if and only if `status` is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Complaint {
    id: ComplaintId,
    title: String,
    description: String,
    category: Category,
    location: Option<String>,
    difficulty: Difficulty,
    emergency: bool,
    status: ComplaintStatus,
    raised_by: UserId,
    volunteer: Option<Volunteer>,
    fix_till_date: NaiveDate,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl Complaint {
    /// Assemble a complaint, rejecting drafts that break the status invariants.
    pub fn new(draft: ComplaintDraft) -> Result<Self, ComplaintValidationError> {
        let status = draft.status;
        if draft.volunteer.is_some() != status.expects_volunteer() {
            return Err(ComplaintValidationError::VolunteerMismatch { status });
        }
        if draft.resolved_at.is_some() != (status == ComplaintStatus::Resolved) {
            return Err(ComplaintValidationError::ResolvedAtMismatch { status });
        }
        let ComplaintDraft {
            id,
            title,
            description,
            category,
            location,
            difficulty,
            emergency,
            status,
            raised_by,
            volunteer,
            fix_till_date,
            created_at,
            resolved_at,
        } = draft;
        Ok(Self {
            id,
            title,
            description,
            category,
            location,
            difficulty,
            emergency,
            status,
            raised_by,
            volunteer,
            fix_till_date,
            created_at,
            resolved_at,
        })
    }

    /// Open a freshly submitted complaint.
    pub fn open(
        id: ComplaintId,
        submission: NewComplaint,
        raised_by: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        let NewComplaint {
            title,
            description,
            category,
            location,
            difficulty,
            emergency,
            fix_till_date,
        } = submission;
        Self {
            id,
            title,
            description,
            category,
            location,
            difficulty,
            emergency,
            status: ComplaintStatus::Open,
            raised_by,
            volunteer: None,
            fix_till_date,
            created_at,
            resolved_at: None,
        }
    }

    /// Decompose into a draft for rebuilding.
    pub fn into_draft(self) -> ComplaintDraft {
        ComplaintDraft {
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            location: self.location,
            difficulty: self.difficulty,
            emergency: self.emergency,
            status: self.status,
            raised_by: self.raised_by,
            volunteer: self.volunteer,
            fix_till_date: self.fix_till_date,
            created_at: self.created_at,
            resolved_at: self.resolved_at,
        }
    }

    /// Apply a raiser edit. Status and volunteer fields are untouched.
    pub fn with_edit(self, edit: ComplaintEdit) -> Self {
        let ComplaintEdit {
            title,
            description,
            location,
            emergency,
            fix_till_date,
        } = edit;
        Self {
            title: title.unwrap_or(self.title),
            description: description.unwrap_or(self.description),
            location: location.unwrap_or(self.location),
            emergency: emergency.unwrap_or(self.emergency),
            fix_till_date: fix_till_date.unwrap_or(self.fix_till_date),
            ..self
        }
    }

    /// Refresh the cached volunteer name after `volunteer` renamed themselves.
    /// Complaints assigned to someone else are returned unchanged.
    #[must_use]
    pub fn with_volunteer_name(self, volunteer: &UserId, name: &str) -> Self {
        let refreshed = self.volunteer.map(|current| {
            if &current.id == volunteer {
                Volunteer {
                    id: current.id,
                    name: name.to_owned(),
                }
            } else {
                current
            }
        });
        Self {
            volunteer: refreshed,
            ..self
        }
    }

    pub fn id(&self) -> ComplaintId {
        self.id
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn is_emergency(&self) -> bool {
        self.emergency
    }

    pub fn status(&self) -> ComplaintStatus {
        self.status
    }

    pub fn raised_by(&self) -> &UserId {
        &self.raised_by
    }

    pub fn volunteer(&self) -> Option<&Volunteer> {
        self.volunteer.as_ref()
    }

    /// Identifier of the assigned volunteer, if any.
    pub fn volunteer_id(&self) -> Option<&UserId> {
        self.volunteer.as_ref().map(|volunteer| &volunteer.id)
    }

    pub fn fix_till_date(&self) -> NaiveDate {
        self.fix_till_date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }
}

fn required_text(
    field: &'static str,
    raw: Option<String>,
    max: usize,
) -> Result<String, ComplaintValidationError> {
    let value = raw.as_deref().map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(ComplaintValidationError::MissingField { field });
    }
    bounded(field, value, max)
}

fn bounded(field: &'static str, value: &str, max: usize) -> Result<String, ComplaintValidationError> {
    if value.chars().count() > max {
        return Err(ComplaintValidationError::FieldTooLong { field, max });
    }
    Ok(value.to_owned())
}

fn optional_text(
    field: &'static str,
    raw: Option<String>,
    max: usize,
) -> Result<Option<String>, ComplaintValidationError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => bounded(field, value, max).map(Some),
    }
}

/// Raw complaint submission as received from a student.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintSubmission {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub difficulty: Option<String>,
    pub emergency: bool,
    pub fix_till_date: Option<NaiveDate>,
}

/// Validated fields of a complaint about to be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComplaint {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub location: Option<String>,
    pub difficulty: Difficulty,
    pub emergency: bool,
    pub fix_till_date: NaiveDate,
}

impl TryFrom<ComplaintSubmission> for NewComplaint {
    type Error = ComplaintValidationError;

    fn try_from(value: ComplaintSubmission) -> Result<Self, Self::Error> {
        let title = required_text("title", value.title, TITLE_MAX)?;
        let description = required_text("description", value.description, DESCRIPTION_MAX)?;
        let category = Category::new(value.category.unwrap_or_default())?;
        let difficulty = value
            .difficulty
            .filter(|raw| !raw.trim().is_empty())
            .ok_or(ComplaintValidationError::MissingField {
                field: "difficulty",
            })?
            .parse()?;
        let fix_till_date = value
            .fix_till_date
            .ok_or(ComplaintValidationError::MissingField {
                field: "fixTillDate",
            })?;
        let location = optional_text("location", value.location, LOCATION_MAX)?;
        Ok(Self {
            title,
            description,
            category,
            location,
            difficulty,
            emergency: value.emergency,
            fix_till_date,
        })
    }
}

/// Fields a raiser may change while the complaint is still open.
///
/// `location: Some(None)` clears the location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<Option<String>>,
    pub emergency: Option<bool>,
    pub fix_till_date: Option<NaiveDate>,
}

impl ComplaintEdit {
    /// Validate an edit; blank text fields are rejected rather than ignored.
    pub fn validate(self) -> Result<Self, ComplaintValidationError> {
        let raw = self;
        let title = raw
            .title
            .map(|title| required_text("title", Some(title), TITLE_MAX))
            .transpose()?;
        let description = raw
            .description
            .map(|text| required_text("description", Some(text), DESCRIPTION_MAX))
            .transpose()?;
        let location = raw
            .location
            .map(|location| optional_text("location", location, LOCATION_MAX))
            .transpose()?;
        let edit = Self {
            title,
            description,
            location,
            emergency: raw.emergency,
            fix_till_date: raw.fix_till_date,
        };
        if edit == Self::default() {
            return Err(ComplaintValidationError::EmptyEdit);
        }
        Ok(edit)
    }
}

/// Listing filter; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintFilter {
    pub raised_by: Option<UserId>,
    pub status: Option<ComplaintStatus>,
    pub category: Option<Category>,
    pub volunteer_id: Option<UserId>,
}

impl ComplaintFilter {
    /// Whether `complaint` satisfies every set criterion.
    pub fn matches(&self, complaint: &Complaint) -> bool {
        self.raised_by
            .as_ref()
            .is_none_or(|id| complaint.raised_by() == id)
            && self.status.is_none_or(|status| complaint.status() == status)
            && self
                .category
                .as_ref()
                .is_none_or(|category| complaint.category() == category)
            && self
                .volunteer_id
                .as_ref()
                .is_none_or(|id| complaint.volunteer_id() == Some(id))
    }
}

/// Ordering for volunteer-facing lists: emergencies first, then the earliest
/// due date, then the oldest complaint.
pub fn volunteer_queue_order(a: &Complaint, b: &Complaint) -> Ordering {
    b.is_emergency()
        .cmp(&a.is_emergency())
        .then_with(|| a.fix_till_date().cmp(&b.fix_till_date()))
        .then_with(|| a.created_at().cmp(&b.created_at()))
}

/// Sort complaints in place using [`volunteer_queue_order`].
pub fn sort_for_volunteers(complaints: &mut [Complaint]) {
    complaints.sort_by(volunteer_queue_order);
}

#[cfg(test)]
#[path = "complaint_tests.rs"]
mod tests;
