//! User account types: role enum and identity newtypes

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Maximum length for usernames (matches the users.username column)
const MAX_USERNAME_LEN: usize = 150;

/// Maximum length for email addresses (RFC 5321 limit)
const MAX_EMAIL_LEN: usize = 254;

/// Username pattern: letters, digits, and @ . + - _
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9@.+_-]+$").expect("invalid username regex"));

/// Loose email shape check: local@domain.tld, no whitespace
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("invalid email regex"));

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Buyer,
    Seller,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(Self::Buyer),
            "seller" => Ok(Self::Seller),
            "admin" => Ok(Self::Admin),
            other => Err(ValidationError::InvalidVariant {
                field: "role",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated username
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Create a new username.
    ///
    /// # Rules
    /// - Non-empty (after trimming whitespace)
    /// - Max 150 characters
    /// - Letters, digits, and @ . + - _ only
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "username" });
        }

        if trimmed.len() > MAX_USERNAME_LEN {
            return Err(ValidationError::TooLong {
                field: "username",
                max: MAX_USERNAME_LEN,
            });
        }

        if !USERNAME_RE.is_match(trimmed) {
            return Err(ValidationError::InvalidFormat {
                field: "username",
                reason: "may only contain letters, digits, and @ . + - _",
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validated email address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Create a new email address.
    ///
    /// Checks shape only (local@domain.tld); deliverability is not
    /// this crate's problem.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "email" });
        }

        if trimmed.len() > MAX_EMAIL_LEN {
            return Err(ValidationError::TooLong {
                field: "email",
                max: MAX_EMAIL_LEN,
            });
        }

        if !EMAIL_RE.is_match(trimmed) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "must look like local@domain.tld",
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trip() {
        for role in [Role::Buyer, Role::Seller, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn role_rejects_unknown() {
        let err = "superuser".parse::<Role>().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidVariant { .. }));
    }

    #[test]
    fn role_default_is_buyer() {
        assert_eq!(Role::default(), Role::Buyer);
    }

    #[test]
    fn valid_usernames() {
        assert!(Username::new("nail_artist_99").is_ok());
        assert!(Username::new("maria.lopez").is_ok());
        assert!(Username::new("a").is_ok());
        assert_eq!(Username::new("  trimmed  ").unwrap().as_str(), "trimmed");
    }

    #[test]
    fn username_rejects_spaces_and_symbols() {
        assert!(matches!(
            Username::new("two words").unwrap_err(),
            ValidationError::InvalidFormat { .. }
        ));
        assert!(matches!(
            Username::new("nope!").unwrap_err(),
            ValidationError::InvalidFormat { .. }
        ));
    }

    #[test]
    fn username_rejects_empty() {
        assert!(matches!(
            Username::new("   ").unwrap_err(),
            ValidationError::Empty { .. }
        ));
    }

    #[test]
    fn username_max_length() {
        let ok = "a".repeat(150);
        assert!(Username::new(&ok).is_ok());

        let too_long = "a".repeat(151);
        assert!(matches!(
            Username::new(&too_long).unwrap_err(),
            ValidationError::TooLong { max: 150, .. }
        ));
    }

    #[test]
    fn valid_emails() {
        assert!(Email::new("maria@example.com").is_ok());
        assert!(Email::new("a+b@sub.domain.co").is_ok());
    }

    #[test]
    fn email_rejects_malformed() {
        for bad in ["", "plain", "a@b", "a b@c.com", "@c.com"] {
            assert!(Email::new(bad).is_err(), "accepted {:?}", bad);
        }
    }
}
