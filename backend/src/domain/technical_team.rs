//! Technical team roster.

use super::{Department, UserId, UserName};

/// A technical team member as listed on the roster.
///
/// `available` is informational; it does not gate which complaints a member
/// may accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechnicalMember {
    pub user_id: UserId,
    pub name: UserName,
    pub department: Department,
    pub available: bool,
}

impl TechnicalMember {
    /// Flip availability.
    #[must_use]
    pub fn toggled(self) -> Self {
        Self {
            available: !self.available,
            ..self
        }
    }
}
