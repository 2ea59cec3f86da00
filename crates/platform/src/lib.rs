//! Platform Crate - Technical Infrastructure
//!
//! This crate provides the shared technical foundations of the credential
//! subsystem:
//! - Cryptographic utilities (PBKDF2, SHA-256, Base64, constant-time compare)
//! - Password policy validation, hashing, and verification
//! - Clock abstraction for testable time handling
//!
//! It carries no domain knowledge: user records, lockout rules, and
//! authorization live in the `auth` crate.

pub mod clock;
pub mod crypto;
pub mod password;
