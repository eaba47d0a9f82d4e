//! Review rating validation and polarity classification

use super::ValidationError;

/// Lowest accepted rating
const MIN_RATING: i32 = 1;

/// Highest accepted rating
const MAX_RATING: i32 = 5;

/// Whether a review counts for or against the reviewed seller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewPolarity {
    Positive,
    Negative,
}

/// Validated star rating (1 to 5)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rating(i32);

impl Rating {
    pub fn new(n: i32) -> Result<Self, ValidationError> {
        if !(MIN_RATING..=MAX_RATING).contains(&n) {
            return Err(ValidationError::OutOfRange {
                field: "rating",
                min: MIN_RATING as i64,
                max: MAX_RATING as i64,
            });
        }

        Ok(Self(n))
    }

    pub fn value(&self) -> i32 {
        self.0
    }

    /// Ratings of 4 and 5 count as positive, everything else as negative.
    pub fn polarity(&self) -> ReviewPolarity {
        if self.0 >= 4 {
            ReviewPolarity::Positive
        } else {
            ReviewPolarity::Negative
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_one_through_five() {
        for n in 1..=5 {
            assert_eq!(Rating::new(n).unwrap().value(), n);
        }
    }

    #[test]
    fn rejects_out_of_range() {
        for n in [0, 6, -1, 100] {
            assert!(matches!(
                Rating::new(n).unwrap_err(),
                ValidationError::OutOfRange { min: 1, max: 5, .. }
            ));
        }
    }

    #[test]
    fn four_and_five_are_positive() {
        assert_eq!(Rating::new(4).unwrap().polarity(), ReviewPolarity::Positive);
        assert_eq!(Rating::new(5).unwrap().polarity(), ReviewPolarity::Positive);
    }

    #[test]
    fn three_and_below_are_negative() {
        for n in 1..=3 {
            assert_eq!(Rating::new(n).unwrap().polarity(), ReviewPolarity::Negative);
        }
    }
}
