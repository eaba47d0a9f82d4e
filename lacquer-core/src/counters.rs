//! Derived-counter formulas
//!
//! The pure calculations behind the denormalized columns: `carts.total` and
//! `reputations.average_rating`. The server recomputes these inside the same
//! transaction as the write that invalidated them; this module owns only the
//! arithmetic so it stays trivially testable.

use rust_decimal::Decimal;

/// Weight of a positive review in the reputation average
const POSITIVE_WEIGHT: i64 = 5;

/// Weight of a negative review in the reputation average
const NEGATIVE_WEIGHT: i64 = 1;

/// Cart total: sum of quantity times current unit price over all lines.
///
/// Totals always derive from the product's price at recompute time, not
/// the price when the item entered the cart.
pub fn cart_total(lines: &[(i32, Decimal)]) -> Decimal {
    lines
        .iter()
        .map(|(quantity, unit_price)| Decimal::from(*quantity) * *unit_price)
        .sum()
}

/// Reputation average: `(5 * positive + 1 * negative) / (positive + negative)`,
/// rounded to two decimal places. Zero when there are no reviews at all.
pub fn average_rating(positive: i64, negative: i64) -> Decimal {
    let total = positive + negative;
    if total == 0 {
        return Decimal::ZERO;
    }

    let weighted = Decimal::from(positive * POSITIVE_WEIGHT + negative * NEGATIVE_WEIGHT);
    (weighted / Decimal::from(total)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn empty_cart_totals_zero() {
        assert_eq!(cart_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn cart_total_sums_lines() {
        let lines = vec![(2, dec("10.50")), (1, dec("3.25"))];
        assert_eq!(cart_total(&lines), dec("24.25"));
    }

    #[test]
    fn cart_total_scales_with_quantity() {
        let lines = vec![(7, dec("0.99"))];
        assert_eq!(cart_total(&lines), dec("6.93"));
    }

    #[test]
    fn no_reviews_average_is_zero() {
        assert_eq!(average_rating(0, 0), Decimal::ZERO);
    }

    #[test]
    fn all_positive_averages_five() {
        assert_eq!(average_rating(10, 0), dec("5"));
    }

    #[test]
    fn all_negative_averages_one() {
        assert_eq!(average_rating(0, 5), dec("1"));
    }

    #[test]
    fn mixed_reviews_weighted_average() {
        // (5*3 + 1*1) / 4 = 4
        assert_eq!(average_rating(3, 1), dec("4"));
        // (5*1 + 1*1) / 2 = 3
        assert_eq!(average_rating(1, 1), dec("3"));
    }

    #[test]
    fn average_rounds_to_two_places() {
        // (5*1 + 1*2) / 3 = 2.333... -> 2.33
        assert_eq!(average_rating(1, 2), dec("2.33"));
        // (5*2 + 1*1) / 3 = 3.666... -> 3.67
        assert_eq!(average_rating(2, 1), dec("3.67"));
    }
}
