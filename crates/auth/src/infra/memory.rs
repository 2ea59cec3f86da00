//! In-Memory Store
//!
//! Mutex-guarded map keyed by canonical username. Every trait operation
//! takes the lock once, so the increment-then-maybe-lock write is atomic
//! under concurrent failed logins. Used by service tests and small embedded
//! deployments that do not want a database file.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::domain::entity::User;
use crate::domain::repository::CredentialStore;
use crate::domain::value_object::UserRole;
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    next_id: i64,
}

/// Memory-backed credential store
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Inner>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_active_user<T>(
        &self,
        username: &str,
        f: impl FnOnce(&mut User) -> T,
    ) -> AuthResult<T> {
        let mut inner = self.inner.lock().expect("store poisoned");
        match inner.users.get_mut(&canonical(username)) {
            Some(user) if user.is_active => Ok(f(user)),
            _ => Err(AuthError::UserNotFound),
        }
    }
}

fn canonical(username: &str) -> String {
    username.trim().to_ascii_lowercase()
}

impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let inner = self.inner.lock().expect("store poisoned");
        Ok(inner
            .users
            .get(&canonical(username))
            .filter(|u| u.is_active)
            .cloned())
    }

    async fn list_active(&self) -> AuthResult<Vec<User>> {
        let inner = self.inner.lock().expect("store poisoned");
        let mut users: Vec<User> = inner
            .users
            .values()
            .filter(|u| u.is_active)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.canonical().cmp(b.username.canonical()));
        Ok(users)
    }

    async fn record_successful_login(&self, username: &str, at: DateTime<Utc>) -> AuthResult<()> {
        self.with_active_user(username, |user| {
            user.last_login_at = Some(at);
            user.failed_login_attempts = 0;
            user.locked_until = None;
        })
    }

    async fn record_failed_login(
        &self,
        username: &str,
        max_attempts: u32,
        lockout: Duration,
        at: DateTime<Utc>,
    ) -> AuthResult<()> {
        self.with_active_user(username, |user| {
            user.failed_login_attempts += 1;
            // An unexpired expiry is never pushed further out; a lapsed one
            // is replaced so the account can lock again on the next burst
            let relockable = user.locked_until.is_none_or(|until| until <= at);
            if user.failed_login_attempts >= max_attempts && relockable {
                user.locked_until = Some(at + lockout);
            }
        })
    }

    async fn is_locked(&self, username: &str, now: DateTime<Utc>) -> AuthResult<bool> {
        let inner = self.inner.lock().expect("store poisoned");
        Ok(inner
            .users
            .get(&canonical(username))
            .is_some_and(|u| u.is_active && u.is_locked(now)))
    }

    async fn update_password(
        &self,
        username: &str,
        encoded_hash: &str,
        at: DateTime<Utc>,
    ) -> AuthResult<()> {
        self.with_active_user(username, |user| {
            user.password_hash = encoded_hash.to_string();
            user.failed_login_attempts = 0;
            user.locked_until = None;
            user.force_password_change = false;
            user.last_password_change = Some(at);
        })
    }

    async fn replace_hash(&self, username: &str, encoded_hash: &str) -> AuthResult<()> {
        self.with_active_user(username, |user| {
            user.password_hash = encoded_hash.to_string();
        })
    }

    async fn insert(&self, user: &User) -> AuthResult<()> {
        let mut inner = self.inner.lock().expect("store poisoned");
        let key = user.username.canonical().to_string();
        if inner.users.contains_key(&key) {
            return Err(AuthError::DuplicateUsername);
        }
        inner.next_id += 1;
        let mut user = user.clone();
        user.id = inner.next_id;
        inner.users.insert(key, user);
        Ok(())
    }

    async fn set_role(&self, username: &str, role: UserRole) -> AuthResult<()> {
        self.with_active_user(username, |user| {
            user.role = role;
        })
    }

    async fn set_force_password_change(&self, username: &str, force: bool) -> AuthResult<()> {
        self.with_active_user(username, |user| {
            user.force_password_change = force;
        })
    }

    async fn soft_delete(&self, username: &str) -> AuthResult<()> {
        self.with_active_user(username, |user| {
            user.is_active = false;
        })
    }
}
