//! Session
//!
//! Process-local session state: at most one authenticated user per
//! `AuthService` instance. Sessions are never persisted. The capability
//! predicates are pure functions of the session role and advisory only:
//! callers gate application actions on them, the service never blocks a
//! controller operation itself.

use crate::domain::entity::User;
use crate::domain::value_object::UserRole;

/// Current authentication state of one service instance
#[derive(Debug, Default)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Establish the session for an authenticated user
    pub fn sign_in(&mut self, user: User) {
        self.user = Some(user);
    }

    /// Clear the session unconditionally
    pub fn clear(&mut self) {
        self.user = None;
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn role(&self) -> Option<UserRole> {
        self.user.as_ref().map(|u| u.role)
    }

    /// Any authenticated user may run a cycle
    pub fn can_execute_cycle(&self) -> bool {
        self.is_authenticated()
    }

    /// Supervisor and above
    pub fn can_view_history(&self) -> bool {
        self.role().is_some_and(|r| r >= UserRole::Supervisor)
    }

    /// Supervisor and above
    pub fn can_edit_parameters(&self) -> bool {
        self.role().is_some_and(|r| r >= UserRole::Supervisor)
    }

    /// Administrator only
    pub fn can_access_admin(&self) -> bool {
        self.role().is_some_and(|r| r >= UserRole::Administrator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::UserName;
    use chrono::Utc;

    fn user(role: UserRole) -> User {
        User::new(
            UserName::new("someone").unwrap(),
            "100000:c2FsdA==:aGFzaA==".to_string(),
            role,
            Utc::now(),
        )
    }

    #[test]
    fn test_unauthenticated_session_denies_everything() {
        let session = Session::new();
        assert!(!session.is_authenticated());
        assert!(!session.can_execute_cycle());
        assert!(!session.can_view_history());
        assert!(!session.can_edit_parameters());
        assert!(!session.can_access_admin());
    }

    #[test]
    fn test_operator_capabilities() {
        let mut session = Session::new();
        session.sign_in(user(UserRole::Operator));
        assert!(session.can_execute_cycle());
        assert!(!session.can_view_history());
        assert!(!session.can_edit_parameters());
        assert!(!session.can_access_admin());
    }

    #[test]
    fn test_supervisor_capabilities() {
        let mut session = Session::new();
        session.sign_in(user(UserRole::Supervisor));
        assert!(session.can_execute_cycle());
        assert!(session.can_view_history());
        assert!(session.can_edit_parameters());
        assert!(!session.can_access_admin());
    }

    #[test]
    fn test_administrator_capabilities() {
        let mut session = Session::new();
        session.sign_in(user(UserRole::Administrator));
        assert!(session.can_execute_cycle());
        assert!(session.can_view_history());
        assert!(session.can_edit_parameters());
        assert!(session.can_access_admin());
    }

    #[test]
    fn test_clear_drops_user() {
        let mut session = Session::new();
        session.sign_in(user(UserRole::Administrator));
        session.clear();
        assert!(!session.is_authenticated());
        assert!(session.role().is_none());
    }
}
