//! Validation error types

use std::fmt;

/// Validation error for domain models
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// Numeric field is below its minimum
    TooSmall { field: &'static str, min: i64 },

    /// Numeric field is outside its allowed range
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    /// Amount must not be negative
    Negative { field: &'static str },

    /// String doesn't match required format (e.g., slug)
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },

    /// Invalid enum variant
    InvalidVariant { field: &'static str, value: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::TooSmall { field, min } => write!(f, "{} must be at least {}", field, min),
            Self::OutOfRange { field, min, max } => {
                write!(f, "{} must be between {} and {}", field, min, max)
            }
            Self::Negative { field } => write!(f, "{} cannot be negative", field),
            Self::InvalidFormat { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
            Self::InvalidVariant { field, value } => {
                write!(f, "invalid {} value: '{}'", field, value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ValidationError::TooLong {
            field: "title",
            max: 200,
        };
        assert_eq!(
            err.to_string(),
            "title exceeds maximum length of 200 characters"
        );

        let err = ValidationError::OutOfRange {
            field: "rating",
            min: 1,
            max: 5,
        };
        assert_eq!(err.to_string(), "rating must be between 1 and 5");

        let err = ValidationError::TooSmall {
            field: "quantity",
            min: 1,
        };
        assert_eq!(err.to_string(), "quantity must be at least 1");

        let err = ValidationError::Negative { field: "price" };
        assert_eq!(err.to_string(), "price cannot be negative");
    }
}
