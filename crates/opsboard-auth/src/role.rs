//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles recognized by the route policy.
///
/// Roles are not hierarchical: membership in the allow table is the only
/// authority, and no role implies another's routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Administrative staff.
    Admin,
    /// Core team members.
    Core,
    /// General employees.
    Employee,
}

impl Role {
    /// Every role the gateway recognizes.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Core, Role::Employee];

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Core => "core",
            Self::Employee => "employee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = opsboard_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "core" => Ok(Self::Core),
            "employee" => Ok(Self::Employee),
            _ => Err(opsboard_core::AppError::validation(format!(
                "Invalid role: '{s}'. Expected one of: admin, core, employee"
            ))),
        }
    }
}
