//! Infrastructure Layer
//!
//! Store implementations of the `CredentialStore` trait.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryCredentialStore;
pub use sqlite::SqliteCredentialStore;
