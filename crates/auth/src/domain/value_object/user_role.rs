//! User Role Value Object
//!
//! Roles form a strict order: Operator < Supervisor < Administrator.
//! Capability checks are ordered comparisons, never equality checks, so a
//! higher role always implies the capabilities of a lower one.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[repr(i16)]
pub enum UserRole {
    #[default]
    Operator = 0,
    Supervisor = 1,
    Administrator = 2,
}

impl UserRole {
    /// Numeric ID for database storage
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    /// String code for display/serialization
    #[inline]
    pub const fn code(&self) -> &'static str {
        use UserRole::*;
        match self {
            Operator => "operator",
            Supervisor => "supervisor",
            Administrator => "administrator",
        }
    }

    #[inline]
    pub const fn is_supervisor_or_higher(&self) -> bool {
        use UserRole::*;
        matches!(self, Supervisor | Administrator)
    }

    #[inline]
    pub const fn is_administrator(&self) -> bool {
        matches!(self, UserRole::Administrator)
    }

    /// Create from a stored numeric ID
    #[inline]
    pub fn from_id(id: i16) -> Option<Self> {
        use UserRole::*;
        match id {
            0 => Some(Operator),
            1 => Some(Supervisor),
            2 => Some(Administrator),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(UserRole::Operator < UserRole::Supervisor);
        assert!(UserRole::Supervisor < UserRole::Administrator);
        assert!(UserRole::Administrator >= UserRole::Supervisor);
    }

    #[test]
    fn test_role_from_id() {
        assert_eq!(UserRole::from_id(0), Some(UserRole::Operator));
        assert_eq!(UserRole::from_id(1), Some(UserRole::Supervisor));
        assert_eq!(UserRole::from_id(2), Some(UserRole::Administrator));
        assert_eq!(UserRole::from_id(3), None);
    }

    #[test]
    fn test_role_checks() {
        assert!(!UserRole::Operator.is_supervisor_or_higher());
        assert!(UserRole::Supervisor.is_supervisor_or_higher());
        assert!(UserRole::Administrator.is_supervisor_or_higher());
        assert!(!UserRole::Supervisor.is_administrator());
        assert!(UserRole::Administrator.is_administrator());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(UserRole::Operator.to_string(), "operator");
        assert_eq!(UserRole::Administrator.to_string(), "administrator");
    }
}
