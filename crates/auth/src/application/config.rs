//! Application Configuration

use chrono::Duration;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Consecutive failed logins before the account locks
    pub max_login_attempts: u32,
    /// How long a locked account stays locked
    pub lockout_duration: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_login_attempts: 5,
            lockout_duration: Duration::minutes(5),
        }
    }
}
