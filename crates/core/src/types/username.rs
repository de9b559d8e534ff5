//! Login username type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Username`].
///
/// Each variant carries a message suitable for re-prompting the user, so
/// callers (the bot registration flow in particular) surface the exact rule
/// that was violated.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    /// The input string is empty.
    #[error("username cannot be empty")]
    Empty,
    /// The input string is shorter than the minimum.
    #[error("username must be at least {min} characters", min = Username::MIN_LENGTH)]
    TooShort,
    /// The input string is longer than the maximum.
    #[error("username must be at most {max} characters", max = Username::MAX_LENGTH)]
    TooLong,
    /// The input contains a disallowed character.
    #[error("username may only contain latin letters, digits, and underscores")]
    InvalidCharacter,
}

/// A login username.
///
/// ## Constraints
///
/// - Length: 3-20 characters
/// - ASCII letters, digits, and underscores only
///
/// ## Examples
///
/// ```
/// use tablecraft_core::Username;
///
/// assert!(Username::parse("waiter1").is_ok());
/// assert!(Username::parse("ab").is_err());         // too short
/// assert!(Username::parse("anna maria").is_err()); // space not allowed
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Minimum length of a username.
    pub const MIN_LENGTH: usize = 3;

    /// Maximum length of a username.
    pub const MAX_LENGTH: usize = 20;

    /// Parse a `Username` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, shorter than 3 or longer than
    /// 20 characters, or contains anything besides ASCII letters, digits,
    /// and underscores.
    pub fn parse(s: &str) -> Result<Self, UsernameError> {
        if s.is_empty() {
            return Err(UsernameError::Empty);
        }
        // Charset first: once the input is known to be ASCII, byte length
        // and character count agree for the bounds below.
        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(UsernameError::InvalidCharacter);
        }
        if s.len() < Self::MIN_LENGTH {
            return Err(UsernameError::TooShort);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(UsernameError::TooLong);
        }
        Ok(Self(s.to_owned()))
    }

    /// Get the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_usernames() {
        for name in ["abc", "waiter1", "Boba_Fett", "a_b", "x1234567890123456789"] {
            assert!(Username::parse(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(Username::parse(""), Err(UsernameError::Empty));
    }

    #[test]
    fn rejects_too_short() {
        assert_eq!(Username::parse("ab"), Err(UsernameError::TooShort));
    }

    #[test]
    fn rejects_too_long() {
        let long = "a".repeat(21);
        assert_eq!(Username::parse(&long), Err(UsernameError::TooLong));
    }

    #[test]
    fn rejects_disallowed_characters() {
        for name in ["anna maria", "ivan-petrov", "café", "user!", "имя"] {
            assert_eq!(
                Username::parse(name),
                Err(UsernameError::InvalidCharacter),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn multibyte_input_fails_on_charset_not_length() {
        // 16 characters but 32 bytes; the charset rule must win over a
        // byte-length comparison.
        assert_eq!(
            Username::parse("официантофициант"),
            Err(UsernameError::InvalidCharacter)
        );
    }

    #[test]
    fn boundary_lengths_accepted() {
        assert!(Username::parse(&"a".repeat(3)).is_ok());
        assert!(Username::parse(&"a".repeat(20)).is_ok());
    }
}
