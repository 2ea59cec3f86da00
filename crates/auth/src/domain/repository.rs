//! Repository Trait
//!
//! Persistence interface consumed by the application layer. Implementations
//! live in the infrastructure layer and must keep every operation atomic
//! with respect to the row it touches: multiple service instances may share
//! one store (two terminals against the same database).

use chrono::{DateTime, Duration, Utc};

use crate::domain::entity::User;
use crate::domain::value_object::UserRole;
use crate::error::AuthResult;

/// Credential store trait
///
/// All username arguments are matched case-insensitively.
#[trait_variant::make(CredentialStore: Send)]
pub trait LocalCredentialStore {
    /// Find an active user by username
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    /// List active users ordered by username
    async fn list_active(&self) -> AuthResult<Vec<User>>;

    /// Record a successful login: set last-login, reset the failed-attempt
    /// counter, clear any lock-expiry
    async fn record_successful_login(&self, username: &str, at: DateTime<Utc>) -> AuthResult<()>;

    /// Record a failed login as a single atomic conditional write
    ///
    /// Increments the failed-attempt counter. Iff the post-increment count
    /// reaches `max_attempts` and no lock-expiry after `at` is set, the
    /// expiry becomes `at + lockout`. An unexpired expiry is never pushed
    /// further into the future; one that has already lapsed is replaced.
    async fn record_failed_login(
        &self,
        username: &str,
        max_attempts: u32,
        lockout: Duration,
        at: DateTime<Utc>,
    ) -> AuthResult<()>;

    /// Check whether the account is locked at `now`
    async fn is_locked(&self, username: &str, now: DateTime<Utc>) -> AuthResult<bool>;

    /// Replace the password hash as part of a password change: resets the
    /// failed-attempt counter, clears lock-expiry, clears the forced-change
    /// flag, and records the change time
    async fn update_password(
        &self,
        username: &str,
        encoded_hash: &str,
        at: DateTime<Utc>,
    ) -> AuthResult<()>;

    /// Swap only the stored hash (silent rehash during legacy migration)
    ///
    /// Counters, lock state, and the forced-change flag are untouched.
    async fn replace_hash(&self, username: &str, encoded_hash: &str) -> AuthResult<()>;

    /// Insert a new user
    ///
    /// Fails with `DuplicateUsername` when the canonical username already
    /// exists, active or not.
    async fn insert(&self, user: &User) -> AuthResult<()>;

    /// Change a user's role
    async fn set_role(&self, username: &str, role: UserRole) -> AuthResult<()>;

    /// Set or clear the forced-password-change flag
    async fn set_force_password_change(&self, username: &str, force: bool) -> AuthResult<()>;

    /// Soft-delete: excluded from lookups from now on, row retained
    async fn soft_delete(&self, username: &str) -> AuthResult<()>;
}
