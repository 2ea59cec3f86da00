//! Password Workflows
//!
//! Self-service password change plus the administrator reset path.

use platform::password::{ClearTextPassword, is_legacy_hash, verify, verify_legacy};

use crate::application::service::AuthService;
use crate::domain::repository::CredentialStore;
use crate::error::{AuthError, AuthResult};

/// Outcome of the blocking verify-then-hash pass during a password change
enum ChangeCheck {
    WrongCurrent,
    SameAsOld,
    Accepted(String),
}

impl<S: CredentialStore> AuthService<S> {
    /// Change a user's password after verifying the current one
    ///
    /// Failure order: policy violation, unknown user, wrong current
    /// password, new password identical to the old one.
    pub async fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        let new_password = validated(new_password)?;

        let user = self
            .store()
            .find_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let old_password = ClearTextPassword::new(old_password.to_string())
            .map_err(|_| AuthError::WrongCurrentPassword)?;

        let stored = user.password_hash.clone();
        let check = tokio::task::spawn_blocking(move || {
            let verifies = |p: &ClearTextPassword| {
                if is_legacy_hash(&stored) {
                    verify_legacy(p, &stored)
                } else {
                    verify(p, &stored)
                }
            };
            if !verifies(&old_password) {
                return ChangeCheck::WrongCurrent;
            }
            if verifies(&new_password) {
                return ChangeCheck::SameAsOld;
            }
            ChangeCheck::Accepted(new_password.hash().to_storage_string())
        })
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?;

        let encoded = match check {
            ChangeCheck::WrongCurrent => return Err(AuthError::WrongCurrentPassword),
            ChangeCheck::SameAsOld => return Err(AuthError::SameAsOld),
            ChangeCheck::Accepted(encoded) => encoded,
        };

        let now = self.now();
        self.store()
            .update_password(username, &encoded, now)
            .await?;
        self.refresh_session_after_change(&user, &encoded, now);

        tracing::info!(username = %user.username, "Password changed");
        Ok(())
    }

    /// Administrator reset: no current-password verification
    ///
    /// The reset leaves the account with the forced-change flag set, so the
    /// user must pick their own password at the next login.
    pub async fn admin_reset_password(&self, username: &str, new_password: &str) -> AuthResult<()> {
        self.require_admin()?;

        let new_password = validated(new_password)?;

        let user = self
            .store()
            .find_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let encoded =
            tokio::task::spawn_blocking(move || new_password.hash().to_storage_string())
                .await
                .map_err(|e| AuthError::Internal(e.to_string()))?;

        let now = self.now();
        self.store()
            .update_password(username, &encoded, now)
            .await?;
        self.store()
            .set_force_password_change(username, true)
            .await?;

        tracing::info!(username = %user.username, "Password reset by administrator");
        Ok(())
    }

    /// Flag a user to change their password at the next successful login
    pub async fn force_password_change(&self, username: &str) -> AuthResult<()> {
        self.require_admin()?;
        self.store()
            .set_force_password_change(username, true)
            .await?;
        tracing::info!(username, "Password change required at next login");
        Ok(())
    }

    /// Keep the session snapshot in step when the signed-in user changed
    /// their own password
    fn refresh_session_after_change(
        &self,
        changed: &crate::domain::entity::User,
        encoded: &str,
        at: chrono::DateTime<chrono::Utc>,
    ) {
        self.with_session(|s| {
            let matches = s
                .user()
                .is_some_and(|u| u.username.canonical() == changed.username.canonical());
            if matches {
                let mut user = changed.clone();
                user.password_hash = encoded.to_string();
                user.force_password_change = false;
                user.failed_login_attempts = 0;
                user.locked_until = None;
                user.last_password_change = Some(at);
                s.sign_in(user);
            }
        });
    }
}

/// Wrap and policy-check a new password
fn validated(raw: &str) -> AuthResult<ClearTextPassword> {
    let clear = ClearTextPassword::new(raw.to_string())
        .map_err(|e| AuthError::PolicyViolation(e.to_string()))?;
    clear
        .validate_policy()
        .map_err(|e| AuthError::PolicyViolation(e.to_string()))?;
    Ok(clear)
}
