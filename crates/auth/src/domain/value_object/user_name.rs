//! User Name Value Object
//!
//! Usernames are the login identifier. Input case is preserved for display,
//! but uniqueness and every lookup use the lowercase canonical form.
//!
//! ## Invariants
//! - Length: 3..=32 characters after trimming
//! - ASCII letters, digits, and `_ . -` only
//! - At least one letter or digit

use std::fmt;

use thiserror::Error;

/// Minimum length for a username (in characters)
pub const USER_NAME_MIN_LENGTH: usize = 3;

/// Maximum length for a username (in characters)
pub const USER_NAME_MAX_LENGTH: usize = 32;

/// Allowed special characters in a username
const ALLOWED_SPECIAL_CHARS: &[char] = &['_', '.', '-'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserNameError {
    #[error("Username must be at least {min} characters")]
    TooShort { min: usize },

    #[error("Username must be at most {max} characters")]
    TooLong { max: usize },

    #[error("Username may only contain letters, digits, and '_' '.' '-'")]
    InvalidCharacter,

    #[error("Username must contain at least one letter or digit")]
    NoAlphanumeric,
}

/// Validated username with a canonical (lowercase) form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserName {
    original: String,
    canonical: String,
}

impl UserName {
    pub fn new(input: &str) -> Result<Self, UserNameError> {
        let trimmed = input.trim();
        let char_count = trimmed.chars().count();

        if char_count < USER_NAME_MIN_LENGTH {
            return Err(UserNameError::TooShort {
                min: USER_NAME_MIN_LENGTH,
            });
        }
        if char_count > USER_NAME_MAX_LENGTH {
            return Err(UserNameError::TooLong {
                max: USER_NAME_MAX_LENGTH,
            });
        }

        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ALLOWED_SPECIAL_CHARS.contains(&c))
        {
            return Err(UserNameError::InvalidCharacter);
        }

        if !trimmed.chars().any(|c| c.is_ascii_alphanumeric()) {
            return Err(UserNameError::NoAlphanumeric);
        }

        Ok(Self {
            original: trimmed.to_string(),
            canonical: trimmed.to_ascii_lowercase(),
        })
    }

    /// As entered (for display)
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Lowercase form used for uniqueness and lookups
    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_is_lowercase() {
        let name = UserName::new("Operator").unwrap();
        assert_eq!(name.original(), "Operator");
        assert_eq!(name.canonical(), "operator");
    }

    #[test]
    fn test_trims_whitespace() {
        let name = UserName::new("  admin  ").unwrap();
        assert_eq!(name.original(), "admin");
    }

    #[test]
    fn test_length_bounds() {
        assert!(matches!(
            UserName::new("ab"),
            Err(UserNameError::TooShort { .. })
        ));
        assert!(matches!(
            UserName::new(&"a".repeat(USER_NAME_MAX_LENGTH + 1)),
            Err(UserNameError::TooLong { .. })
        ));
        assert!(UserName::new(&"a".repeat(USER_NAME_MAX_LENGTH)).is_ok());
    }

    #[test]
    fn test_character_rules() {
        assert!(UserName::new("shift-lead_2.a").is_ok());
        assert!(matches!(
            UserName::new("op erator"),
            Err(UserNameError::InvalidCharacter)
        ));
        assert!(matches!(
            UserName::new("..."),
            Err(UserNameError::NoAlphanumeric)
        ));
    }
}
