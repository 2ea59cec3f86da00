//! Auth (Credential & Access Control) Module
//!
//! Clean Architecture structure:
//! - `domain/` - User entity, value objects, the `CredentialStore` trait
//! - `application/` - `AuthService` workflows, session, configuration
//! - `infra/` - SQLite and in-memory store implementations
//!
//! ## Features
//! - Login/logout with per-account lockout after repeated failures
//! - Role-based capability checks (Operator < Supervisor < Administrator)
//! - Password change, administrator reset, forced-change-on-next-login
//! - One-time migration of legacy unsalted hashes on successful login
//!
//! ## Security Model
//! - Passwords hashed with salted PBKDF2-HMAC-SHA256 (100k iterations)
//! - Constant-time verification; locked accounts are rejected before any
//!   verify attempt
//! - Wrong username and wrong password are indistinguishable to callers

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

// Re-exports for convenience
pub use application::{AuthConfig, AuthService, LoginOutcome, Session};
pub use domain::{CredentialStore, User, UserName, UserRole};
pub use error::{AuthError, AuthResult};
pub use infra::{MemoryCredentialStore, SqliteCredentialStore};
