//! Password Hashing and Verification
//!
//! Salted, iterated password handling with:
//! - PBKDF2-HMAC-SHA256 key derivation (100k iterations)
//! - Zeroization of clear-text input
//! - Constant-time comparison
//! - Legacy (unsalted single-round SHA-256) hash detection and migration
//!
//! ## Storage format
//! Hashes are stored as a single string `iterations:salt:hash` with salt and
//! hash base64-encoded. A stored value with no `:` separator is a legacy
//! digest; the distinction is structural, there is no version field.
//!
//! ## Design
//! Policy validation is separate from hashing so callers can reject weak
//! passwords before paying the key-derivation cost, and so login can still
//! verify credentials that predate the current policy.

use std::fmt;

use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto;

// ============================================================================
// Constants
// ============================================================================

/// PBKDF2 iteration count for newly created hashes
pub const HASH_ITERATIONS: u32 = 100_000;

/// Salt length in bytes
pub const SALT_SIZE: usize = 32;

/// Derived key length in bytes
pub const HASH_SIZE: usize = 32;

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum password length
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Exact-match denylist of passwords too common to allow
const WEAK_PASSWORDS: &[&str] = &[
    "123456",
    "password",
    "admin",
    "1234",
    "12345",
    "123456789",
    "qwerty",
];

// ============================================================================
// Error Types
// ============================================================================

/// Password policy violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    /// Password is too short
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    /// Password is too long
    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    /// Password lacks required character classes
    #[error("Password must contain at least one letter and one digit")]
    MissingComplexity,

    /// Password matches the weak-password denylist
    #[error("Password is too common and easily guessable")]
    TooCommon,
}

/// Password hashing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordHashError {
    /// Empty input cannot be hashed
    #[error("Password cannot be empty")]
    EmptyInput,
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization
///
/// Does not implement `Clone` to prevent accidental copies; `Debug` output
/// is redacted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Wrap user input
    ///
    /// Only rejects empty input. Policy checks are a separate, explicit step
    /// via [`Self::validate_policy`].
    pub fn new(raw: String) -> Result<Self, PasswordHashError> {
        if raw.is_empty() {
            return Err(PasswordHashError::EmptyInput);
        }
        Ok(Self(raw))
    }

    /// Validate against the password policy
    ///
    /// Rules:
    /// - At least [`MIN_PASSWORD_LENGTH`] characters
    /// - At most [`MAX_PASSWORD_LENGTH`] characters
    /// - At least one ASCII letter and one digit
    /// - Not an exact (case-insensitive) match of the weak-password denylist
    pub fn validate_policy(&self) -> Result<(), PasswordPolicyError> {
        let char_count = self.0.chars().count();

        if char_count < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if char_count > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        let has_letter = self.0.chars().any(|c| c.is_ascii_alphabetic());
        let has_digit = self.0.chars().any(|c| c.is_ascii_digit());
        if !has_letter || !has_digit {
            return Err(PasswordPolicyError::MissingComplexity);
        }

        if WEAK_PASSWORDS
            .iter()
            .any(|weak| self.0.eq_ignore_ascii_case(weak))
        {
            return Err(PasswordPolicyError::TooCommon);
        }

        Ok(())
    }

    /// Hash with a fresh random salt at the current iteration count
    pub fn hash(&self) -> HashedPassword {
        let salt = crypto::random_bytes(SALT_SIZE);
        let key = crypto::derive_key(self.0.as_bytes(), &salt, HASH_ITERATIONS);
        HashedPassword {
            derived_key: key.to_vec(),
            salt,
            iterations: HASH_ITERATIONS,
        }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Derived key, salt, and iteration count of a hashed password
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    derived_key: Vec<u8>,
    salt: Vec<u8>,
    iterations: u32,
}

impl HashedPassword {
    /// Encode for storage as `iterations:salt:hash`
    pub fn to_storage_string(&self) -> String {
        format!(
            "{}:{}:{}",
            self.iterations,
            crypto::to_base64(&self.salt),
            crypto::to_base64(&self.derived_key)
        )
    }

    /// Decode a storage string
    ///
    /// Returns `None` for anything malformed: wrong part count, non-numeric
    /// iteration field, or invalid base64. Callers treat `None` as
    /// unverifiable, never as an error to surface.
    pub fn from_storage_string(encoded: &str) -> Option<Self> {
        let mut parts = encoded.split(':');
        let iterations: u32 = parts.next()?.parse().ok()?;
        let salt = crypto::from_base64(parts.next()?).ok()?;
        let derived_key = crypto::from_base64(parts.next()?).ok()?;
        if parts.next().is_some() || salt.is_empty() || derived_key.is_empty() {
            return None;
        }
        Some(Self {
            derived_key,
            salt,
            iterations,
        })
    }

    /// Check whether the stored parameters are below current strength
    pub fn needs_rehash(&self) -> bool {
        self.iterations < HASH_ITERATIONS
    }

    /// Verify a password against this hash in constant time
    pub fn verify(&self, password: &ClearTextPassword) -> bool {
        let computed = crypto::derive_key(password.as_bytes(), &self.salt, self.iterations);
        crypto::constant_time_eq(&computed, &self.derived_key)
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("iterations", &self.iterations)
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Storage-string helpers
// ============================================================================

/// Verify a password against an encoded storage string
///
/// Malformed input verifies `false`; this function never fails.
pub fn verify(password: &ClearTextPassword, encoded: &str) -> bool {
    match HashedPassword::from_storage_string(encoded) {
        Some(stored) => stored.verify(password),
        None => false,
    }
}

/// Detect the legacy (pre-migration) hash format
///
/// Legacy hashes are raw base64 digests without the `iterations:salt:hash`
/// separators.
pub fn is_legacy_hash(encoded: &str) -> bool {
    !encoded.is_empty() && !encoded.contains(':')
}

/// Verify against a legacy unsalted single-round SHA-256 digest
///
/// Not constant-time; this path only exists for one-time migration of
/// pre-existing credentials.
pub fn verify_legacy(password: &ClearTextPassword, legacy_digest: &str) -> bool {
    let computed = crypto::to_base64(&crypto::sha256(password.as_bytes()));
    computed == legacy_digest
}

/// Compute a legacy digest (test fixtures and seeding of historical data)
pub fn legacy_digest(password: &str) -> String {
    crypto::to_base64(&crypto::sha256(password.as_bytes()))
}

/// Check whether a stored string was hashed below the current iteration count
///
/// Malformed input counts as needing a rehash.
pub fn needs_rehash(encoded: &str) -> bool {
    match HashedPassword::from_storage_string(encoded) {
        Some(stored) => stored.needs_rehash(),
        None => true,
    }
}

// ============================================================================
// Tests
// ============================================================================
