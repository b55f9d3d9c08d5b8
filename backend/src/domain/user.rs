//! User data model.
//!
//! Users carry a role that drives the complaint lifecycle guards. Technical
//! team members additionally belong to a department that is matched against
//! complaint categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Validation errors raised while building user values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    InvalidId,
    EmptyName,
    NameTooLong { max: usize },
    InvalidEmail,
    EmptyDepartment,
    DepartmentTooLong { max: usize },
    UnknownRole(String),
    MissingDepartment,
    UnexpectedDepartment,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::NameTooLong { max } => write!(f, "name must be at most {max} characters"),
            Self::InvalidEmail => write!(f, "email must be a valid address"),
            Self::EmptyDepartment => write!(f, "department must not be empty"),
            Self::DepartmentTooLong { max } => {
                write!(f, "department must be at most {max} characters")
            }
            Self::UnknownRole(role) => write!(f, "unknown role: {role}"),
            Self::MissingDepartment => write!(f, "technical members must have a department"),
            Self::UnexpectedDepartment => {
                write!(f, "only technical members may have a department")
            }
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from a string.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Role assigned to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Technical,
    Admin,
}

impl Role {
    /// Stable storage label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Technical => "technical",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "technical" => Ok(Self::Technical),
            "admin" => Ok(Self::Admin),
            other => Err(UserValidationError::UnknownRole(other.to_owned())),
        }
    }
}

/// Maximum length for names.
pub const USER_NAME_MAX: usize = 64;
/// Maximum length for department labels.
pub const DEPARTMENT_MAX: usize = 64;
const EMAIL_MAX: usize = 254;

/// Display name shown on complaints, messages and the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    /// Validate and construct a [`UserName`]; surrounding whitespace is trimmed.
    pub fn new(name: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        if trimmed.chars().count() > USER_NAME_MAX {
            return Err(UserValidationError::NameTooLong {
                max: USER_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserName> for String {
    fn from(value: UserName) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Login identifier, normalised to lowercase.
///
/// # Examples
/// ```
/// use helpdesk::domain::Email;
///
/// let email = Email::new("  Ada@Campus.EDU ").expect("valid email");
/// assert_eq!(email.as_ref(), "ada@campus.edu");
/// assert!(Email::new("not-an-address").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Validate and normalise an email address.
    pub fn new(email: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = email.as_ref().trim().to_lowercase();
        if normalised.len() > EMAIL_MAX || normalised.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidEmail);
        }
        let Some((local, domain)) = normalised.split_once('@') else {
            return Err(UserValidationError::InvalidEmail);
        };
        let domain_ok = !domain.contains('@')
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.');
        if local.is_empty() || !domain_ok {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Department a technical member belongs to.
///
/// Labels are trimmed and lowercased so they compare directly against
/// complaint categories.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Department(String);

impl Department {
    /// Validate and normalise a department label.
    pub fn new(label: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = label.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            return Err(UserValidationError::EmptyDepartment);
        }
        if normalised.chars().count() > DEPARTMENT_MAX {
            return Err(UserValidationError::DepartmentTooLong {
                max: DEPARTMENT_MAX,
            });
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for Department {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Validated components used to assemble a [`User`].
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub id: UserId,
    pub name: UserName,
    pub email: Email,
    pub role: Role,
    pub department: Option<Department>,
    pub points: u32,
}

/// Application user.
///
/// ## Invariants
/// - `department` is present if and only if `role` is [`Role::Technical`].
/// - `points` only grows, and only through complaint resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    name: UserName,
    email: Email,
    role: Role,
    department: Option<Department>,
    points: u32,
}

impl User {
    /// Build a user, enforcing the role/department pairing.
    pub fn new(draft: UserDraft) -> Result<Self, UserValidationError> {
        let UserDraft {
            id,
            name,
            email,
            role,
            department,
            points,
        } = draft;
        match (role, department.is_some()) {
            (Role::Technical, false) => return Err(UserValidationError::MissingDepartment),
            (Role::Student | Role::Admin, true) => {
                return Err(UserValidationError::UnexpectedDepartment);
            }
            _ => {}
        }
        Ok(Self {
            id,
            name,
            email,
            role,
            department,
            points,
        })
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &UserName {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn department(&self) -> Option<&Department> {
        self.department.as_ref()
    }

    /// Points accumulated by resolving complaints.
    pub fn points(&self) -> u32 {
        self.points
    }

    /// Apply a profile edit, returning the updated user.
    ///
    /// Only technical members may change department.
    pub fn with_profile(self, update: ProfileUpdate) -> Result<Self, UserValidationError> {
        let ProfileUpdate { name, department } = update;
        if department.is_some() && self.role != Role::Technical {
            return Err(UserValidationError::UnexpectedDepartment);
        }
        Ok(Self {
            name: name.unwrap_or(self.name),
            department: department.or(self.department),
            ..self
        })
    }
}

/// Editable profile fields. Points and role are not editable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<UserName>,
    pub department: Option<Department>,
}

impl ProfileUpdate {
    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.department.is_none()
    }
}
