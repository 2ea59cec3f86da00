//! User Entity
//!
//! One record per account. The password hash is carried as its opaque
//! storage encoding; all cryptography lives in `platform::password`.
//! Rows are never hard-deleted: `is_active = false` excludes a user from
//! lookups and listings.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{UserName, UserRole};

/// User identity record
#[derive(Debug, Clone)]
pub struct User {
    /// Database identifier (0 until inserted)
    pub id: i64,
    /// Username (unique, case-insensitive)
    pub username: UserName,
    /// Role (Operator, Supervisor, Administrator)
    pub role: UserRole,
    /// Encoded password hash (`iterations:salt:hash` or legacy digest)
    pub password_hash: String,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last successful login time
    pub last_login_at: Option<DateTime<Utc>>,
    /// Soft-delete flag
    pub is_active: bool,
    /// Consecutive failed login attempts
    pub failed_login_attempts: u32,
    /// Account locked until this point in time (expires implicitly)
    pub locked_until: Option<DateTime<Utc>>,
    /// User must change password on next successful login
    pub force_password_change: bool,
    /// Last password change time
    pub last_password_change: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new user ready for insertion
    pub fn new(
        username: UserName,
        password_hash: String,
        role: UserRole,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            username,
            role,
            password_hash,
            created_at,
            last_login_at: None,
            is_active: true,
            failed_login_attempts: 0,
            locked_until: None,
            force_password_change: false,
            last_password_change: None,
        }
    }

    /// Check whether the account is locked at `now`
    ///
    /// Expiry is lazy: once `now` passes `locked_until` the account is
    /// implicitly unlocked, no cleanup write required.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        match self.locked_until {
            Some(until) => now < until,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> User {
        User::new(
            UserName::new("operator").unwrap(),
            "100000:c2FsdA==:aGFzaA==".to_string(),
            UserRole::Operator,
            Utc::now(),
        )
    }

    #[test]
    fn test_new_user_defaults() {
        let user = user();
        assert!(user.is_active);
        assert_eq!(user.failed_login_attempts, 0);
        assert!(user.locked_until.is_none());
        assert!(!user.force_password_change);
    }

    #[test]
    fn test_lock_expires_implicitly() {
        let now = Utc::now();
        let mut user = user();
        assert!(!user.is_locked(now));

        user.locked_until = Some(now + Duration::minutes(5));
        assert!(user.is_locked(now));
        assert!(user.is_locked(now + Duration::minutes(4)));
        assert!(!user.is_locked(now + Duration::minutes(5)));
        assert!(!user.is_locked(now + Duration::minutes(6)));
    }
}
