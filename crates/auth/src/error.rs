//! Auth Error Types
//!
//! Expected business failures (wrong password, locked account, duplicate
//! username) are typed variants returned to the immediate caller; storage
//! failures wrap the underlying driver error and propagate. No variant ever
//! carries hash material or attempt counters.

use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Account is locked (too many failed attempts)
    #[error("Account is temporarily locked due to multiple failed login attempts")]
    AccountLocked,

    /// Wrong username or password
    ///
    /// Deliberately does not distinguish the two, to avoid username
    /// enumeration.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// User not found (admin-facing operations only; login callers see
    /// `InvalidCredentials` instead)
    #[error("User not found")]
    UserNotFound,

    /// New password rejected by the password policy
    #[error("Password policy violation: {0}")]
    PolicyViolation(String),

    /// Current password did not verify during a password change
    #[error("Current password is incorrect")]
    WrongCurrentPassword,

    /// New password is identical to the current one
    #[error("New password must differ from the current password")]
    SameAsOld,

    /// Username below the minimum length
    #[error("Username must be at least {min} characters")]
    UsernameTooShort { min: usize },

    /// Username rejected by the username rules
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    /// Username already exists (case-insensitive)
    #[error("Username already exists")]
    DuplicateUsername,

    /// Caller lacks the required role
    #[error("Only administrators can perform this operation")]
    Unauthorized,

    /// Database error
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
