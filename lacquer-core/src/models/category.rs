//! Category slug validation
//!
//! Slug format: lowercase alphanumeric with hyphens

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// Maximum length for category slugs
const MAX_SLUG_LEN: usize = 64;

/// Slug pattern: starts with alphanumeric, hyphen-separated
/// Matches DB constraint: ^[a-z0-9][a-z0-9-]{0,63}$
static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]{0,63}$").expect("invalid slug regex"));

/// Validated category slug
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slug(String);

impl Slug {
    /// Create a new slug, validating format.
    ///
    /// # Rules
    /// - Max 64 characters
    /// - Lowercase alphanumeric and hyphens
    /// - Must start with alphanumeric
    ///
    /// # Example
    /// ```
    /// use lacquer_core::models::Slug;
    ///
    /// assert!(Slug::new("esmaltes-lacas").is_ok());
    /// assert!(Slug::new("Esmaltes").is_err());  // uppercase
    /// assert!(Slug::new("-lacas").is_err());    // starts with hyphen
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "slug" });
        }

        if s.len() > MAX_SLUG_LEN {
            return Err(ValidationError::TooLong {
                field: "slug",
                max: MAX_SLUG_LEN,
            });
        }

        if !SLUG_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "slug",
                reason: "must be lowercase alphanumeric with hyphens, starting with alphanumeric",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
