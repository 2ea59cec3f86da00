//! User Administration
//!
//! Administrator-only management surface: creating users, changing roles,
//! soft deletion, and listing. Authorization is checked before any other
//! validation so a non-administrator learns nothing about the arguments.

use platform::password::ClearTextPassword;

use crate::application::service::AuthService;
use crate::domain::entity::User;
use crate::domain::repository::CredentialStore;
use crate::domain::value_object::{UserName, UserRole, user_name::USER_NAME_MIN_LENGTH};
use crate::error::{AuthError, AuthResult};

impl<S: CredentialStore> AuthService<S> {
    /// Create a new user with `force_password_change` unset
    ///
    /// Failure order: authorization, username length, username rules,
    /// password policy, duplicate username.
    pub async fn add_user(&self, username: &str, password: &str, role: UserRole) -> AuthResult<()> {
        self.require_admin()?;

        let trimmed = username.trim();
        if trimmed.chars().count() < USER_NAME_MIN_LENGTH {
            return Err(AuthError::UsernameTooShort {
                min: USER_NAME_MIN_LENGTH,
            });
        }
        let username =
            UserName::new(trimmed).map_err(|e| AuthError::InvalidUsername(e.to_string()))?;

        let password = ClearTextPassword::new(password.to_string())
            .map_err(|e| AuthError::PolicyViolation(e.to_string()))?;
        password
            .validate_policy()
            .map_err(|e| AuthError::PolicyViolation(e.to_string()))?;

        let encoded = tokio::task::spawn_blocking(move || password.hash().to_storage_string())
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let user = User::new(username, encoded, role, self.now());
        self.store().insert(&user).await?;

        tracing::info!(username = %user.username, role = %role, "User added");
        Ok(())
    }

    /// Change a user's role
    pub async fn set_role(&self, username: &str, role: UserRole) -> AuthResult<()> {
        self.require_admin()?;
        self.store().set_role(username, role).await?;
        tracing::info!(username, role = %role, "Role changed");
        Ok(())
    }

    /// Soft-delete a user; the row is retained and the name stays taken
    pub async fn remove_user(&self, username: &str) -> AuthResult<()> {
        self.require_admin()?;
        self.store().soft_delete(username).await?;
        tracing::info!(username, "User deactivated");
        Ok(())
    }

    /// List active users ordered by username
    pub async fn list_users(&self) -> AuthResult<Vec<User>> {
        self.require_admin()?;
        self.store().list_active().await
    }
}
