//! Cart item quantity validation

use super::ValidationError;

/// Validated cart item quantity (always >= 1)
///
/// A stored cart row never has quantity below one; callers express
/// "remove this line" by other means, not by writing zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantity(i32);

impl Quantity {
    pub fn new(n: i32) -> Result<Self, ValidationError> {
        if n < 1 {
            return Err(ValidationError::TooSmall {
                field: "quantity",
                min: 1,
            });
        }

        Ok(Self(n))
    }

    pub fn get(&self) -> i32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_one_and_up() {
        assert_eq!(Quantity::new(1).unwrap().get(), 1);
        assert_eq!(Quantity::new(99).unwrap().get(), 99);
    }

    #[test]
    fn rejects_zero_and_negative() {
        assert!(matches!(
            Quantity::new(0).unwrap_err(),
            ValidationError::TooSmall { min: 1, .. }
        ));
        assert!(matches!(
            Quantity::new(-3).unwrap_err(),
            ValidationError::TooSmall { min: 1, .. }
        ));
    }
}
