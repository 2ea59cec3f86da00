//! Application Layer
//!
//! The `AuthService` use cases and their configuration. The service type is
//! defined in `service`; `passwords` and `admin` extend it with the
//! password and user-management workflows.

pub mod admin;
pub mod config;
pub mod passwords;
pub mod service;
pub mod session;


pub use config::AuthConfig;
pub use service::{AuthService, LoginOutcome, PasswordChangeHook};
pub use session::Session;
