//! Account email address.
//!
//! Login and registration forms validate the address locally so an obviously
//! malformed entry never costs a round trip. Addresses echoed back by the
//! backend (inside a profile) are trusted and deserialize without checks.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why a form entry is not an email address.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters (got {0})", max = Email::MAX_LENGTH)]
    TooLong(usize),
    #[error("email must contain an @ symbol")]
    MissingAt,
    #[error("email needs a name before the @")]
    NoMailbox,
    #[error("email needs a domain after the @")]
    NoDomain,
    #[error("email cannot contain whitespace")]
    Whitespace,
}

/// An account email address, trimmed of surrounding whitespace.
///
/// ```
/// use storefront_core::Email;
///
/// let email = Email::parse(" ada@example.com ").unwrap();
/// assert_eq!(email.as_str(), "ada@example.com");
/// assert_eq!(email.domain(), "example.com");
///
/// assert!(Email::parse("ada.example.com").is_err());
/// assert!(Email::parse("ada@").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Longest address accepted (RFC 5321 path limit).
    pub const MAX_LENGTH: usize = 254;

    /// Validate a form entry.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if the trimmed input is empty, too long, contains
    /// whitespace, or lacks a mailbox, an `@` or a domain.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let address = input.trim();
        if address.is_empty() {
            return Err(EmailError::Empty);
        }
        if address.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong(address.len()));
        }
        if address.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let (mailbox, domain) = address.rsplit_once('@').ok_or(EmailError::MissingAt)?;
        if mailbox.is_empty() {
            return Err(EmailError::NoMailbox);
        }
        if domain.is_empty() {
            return Err(EmailError::NoDomain);
        }

        Ok(Self(address.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part after the last `@`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
