//! Auth Service
//!
//! Orchestrates login/logout over a `CredentialStore`, holds the single
//! process-local session, and exposes the capability predicates. Password
//! and user administration workflows live in sibling modules as further
//! `impl` blocks on the same type.
//!
//! Key derivation takes hundreds of milliseconds by design, so every
//! hash/verify runs under `spawn_blocking` and never ties up an event
//! thread.

use std::sync::{Arc, Mutex};

use platform::clock::Clock;
use platform::password::{
    ClearTextPassword, is_legacy_hash, needs_rehash, verify, verify_legacy,
};

use crate::application::config::AuthConfig;
use crate::application::session::Session;
use crate::domain::entity::User;
use crate::domain::repository::CredentialStore;
use crate::error::{AuthError, AuthResult};

/// Callback fired after a successful login when the user must change their
/// password before normal use. Receives the username.
pub type PasswordChangeHook = Box<dyn Fn(&str) + Send + Sync>;

/// Result of a successful login
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginOutcome {
    /// The forced-change flag was set: the caller must present a
    /// password-change flow before granting full access. The session is
    /// established either way.
    pub password_change_required: bool,
}

/// Credential and access-control service
///
/// One instance serves one interactive session; multiple instances may
/// share a store.
pub struct AuthService<S: CredentialStore> {
    store: Arc<S>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
    session: Mutex<Session>,
    password_change_hook: Option<PasswordChangeHook>,
}

impl<S: CredentialStore> AuthService<S> {
    pub fn new(store: Arc<S>, config: Arc<AuthConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            config,
            clock,
            session: Mutex::new(Session::new()),
            password_change_hook: None,
        }
    }

    /// Register the "password change required" notification
    pub fn with_password_change_hook(mut self, hook: PasswordChangeHook) -> Self {
        self.password_change_hook = Some(hook);
        self
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    pub(crate) fn with_session<T>(&self, f: impl FnOnce(&mut Session) -> T) -> T {
        let mut session = self.session.lock().expect("session poisoned");
        f(&mut session)
    }

    /// Require an Administrator session
    pub(crate) fn require_admin(&self) -> AuthResult<()> {
        if self.with_session(|s| s.can_access_admin()) {
            Ok(())
        } else {
            Err(AuthError::Unauthorized)
        }
    }

    /// Authenticate and establish the session
    ///
    /// The lock check runs before any password comparison, so a locked
    /// account never receives a verify attempt. An unknown username fails
    /// as `InvalidCredentials` without touching storage: only real rows
    /// bear failure counters. A successful verify against a legacy or
    /// under-iterated hash silently re-hashes at current parameters.
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<LoginOutcome> {
        let username = username.trim();
        if username.is_empty() || password.trim().is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let now = self.now();
        if self.store.is_locked(username, now).await? {
            tracing::warn!(username, "Login attempt on locked account");
            return Err(AuthError::AccountLocked);
        }

        let Some(user) = self.store.find_by_username(username).await? else {
            tracing::warn!(username, "Login attempt for unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        let clear = ClearTextPassword::new(password.to_string())
            .map_err(|_| AuthError::InvalidCredentials)?;
        let stored = user.password_hash.clone();
        let (verified, upgraded) = tokio::task::spawn_blocking(move || {
            let legacy = is_legacy_hash(&stored);
            let ok = if legacy {
                verify_legacy(&clear, &stored)
            } else {
                verify(&clear, &stored)
            };
            let upgraded = (ok && (legacy || needs_rehash(&stored)))
                .then(|| clear.hash().to_storage_string());
            (ok, upgraded)
        })
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?;

        if !verified {
            self.store
                .record_failed_login(
                    username,
                    self.config.max_login_attempts,
                    self.config.lockout_duration,
                    now,
                )
                .await?;
            tracing::warn!(username, "Invalid login attempt");
            return Err(AuthError::InvalidCredentials);
        }

        // Silent hash upgrade; counters and flags are left alone
        if let Some(encoded) = upgraded {
            self.store.replace_hash(username, &encoded).await?;
            tracing::info!(username, "Password hash upgraded to current parameters");
        }

        self.store.record_successful_login(username, now).await?;

        let mut user = user;
        user.last_login_at = Some(now);
        user.failed_login_attempts = 0;
        user.locked_until = None;
        let password_change_required = user.force_password_change;
        let display_name = user.username.original().to_string();

        self.with_session(|s| s.sign_in(user));
        tracing::info!(username = %display_name, "User signed in");

        if password_change_required {
            if let Some(hook) = &self.password_change_hook {
                hook(&display_name);
            }
        }

        Ok(LoginOutcome {
            password_change_required,
        })
    }

    /// Clear the session unconditionally
    pub fn logout(&self) {
        let signed_out = self.with_session(|s| {
            let name = s.user().map(|u| u.username.original().to_string());
            s.clear();
            name
        });
        if let Some(username) = signed_out {
            tracing::info!(username, "User signed out");
        }
    }

    /// Snapshot of the authenticated user, if any
    pub fn current_user(&self) -> Option<User> {
        self.with_session(|s| s.user().cloned())
    }

    // Capability predicates: advisory, pure functions of the session role.

    pub fn can_execute_cycle(&self) -> bool {
        self.with_session(|s| s.can_execute_cycle())
    }

    pub fn can_view_history(&self) -> bool {
        self.with_session(|s| s.can_view_history())
    }

    pub fn can_edit_parameters(&self) -> bool {
        self.with_session(|s| s.can_edit_parameters())
    }

    pub fn can_access_admin(&self) -> bool {
        self.with_session(|s| s.can_access_admin())
    }
}
