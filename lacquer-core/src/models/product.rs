//! Product listing types: status/type/condition enums and the price newtype

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Largest representable price: 10 digits with 2 decimals
/// (matches the NUMERIC(10,2) column)
const MAX_PRICE_CENTS: i64 = 9_999_999_999;

/// How a product can change hands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    #[default]
    Sale,
    Exchange,
    Both,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Exchange => "exchange",
            Self::Both => "both",
        }
    }

    /// Whether exchange requests may target this product
    pub fn allows_exchange(&self) -> bool {
        matches!(self, Self::Exchange | Self::Both)
    }
}

impl FromStr for ProductType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(Self::Sale),
            "exchange" => Ok(Self::Exchange),
            "both" => Ok(Self::Both),
            other => Err(ValidationError::InvalidVariant {
                field: "product_type",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical condition of a second-hand product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCondition {
    New,
    LikeNew,
    Good,
    Fair,
}

impl ProductCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::LikeNew => "like_new",
            Self::Good => "good",
            Self::Fair => "fair",
        }
    }
}

impl FromStr for ProductCondition {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "like_new" => Ok(Self::LikeNew),
            "good" => Ok(Self::Good),
            "fair" => Ok(Self::Fair),
            other => Err(ValidationError::InvalidVariant {
                field: "condition",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for ProductCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listing lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Available,
    Reserved,
    Sold,
    Inactive,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Sold => "sold",
            Self::Inactive => "inactive",
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

impl FromStr for ProductStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "reserved" => Ok(Self::Reserved),
            "sold" => Ok(Self::Sold),
            "inactive" => Ok(Self::Inactive),
            other => Err(ValidationError::InvalidVariant {
                field: "status",
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated price amount
///
/// Non-negative, at most two decimal places, fits NUMERIC(10,2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Price(Decimal);

impl Price {
    pub fn new(amount: Decimal) -> Result<Self, ValidationError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ValidationError::Negative { field: "price" });
        }

        if amount.scale() > 2 {
            return Err(ValidationError::InvalidFormat {
                field: "price",
                reason: "at most two decimal places",
            });
        }

        if amount > Decimal::new(MAX_PRICE_CENTS, 2) {
            return Err(ValidationError::InvalidFormat {
                field: "price",
                reason: "exceeds the maximum amount of 99999999.99",
            });
        }

        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_type_round_trip() {
        for t in [ProductType::Sale, ProductType::Exchange, ProductType::Both] {
            assert_eq!(t.as_str().parse::<ProductType>().unwrap(), t);
        }
    }

    #[test]
    fn exchange_allowance() {
        assert!(!ProductType::Sale.allows_exchange());
        assert!(ProductType::Exchange.allows_exchange());
        assert!(ProductType::Both.allows_exchange());
    }

    #[test]
    fn condition_round_trip() {
        for c in [
            ProductCondition::New,
            ProductCondition::LikeNew,
            ProductCondition::Good,
            ProductCondition::Fair,
        ] {
            assert_eq!(c.as_str().parse::<ProductCondition>().unwrap(), c);
        }
    }

    #[test]
    fn status_round_trip() {
        for s in [
            ProductStatus::Available,
            ProductStatus::Reserved,
            ProductStatus::Sold,
            ProductStatus::Inactive,
        ] {
            assert_eq!(s.as_str().parse::<ProductStatus>().unwrap(), s);
        }
    }

    #[test]
    fn enums_reject_unknown() {
        assert!("rent".parse::<ProductType>().is_err());
        assert!("mint".parse::<ProductCondition>().is_err());
        assert!("archived".parse::<ProductStatus>().is_err());
    }

    #[test]
    fn valid_prices() {
        assert!(Price::new("0".parse().unwrap()).is_ok());
        assert!(Price::new("15.50".parse().unwrap()).is_ok());
        assert!(Price::new("99999999.99".parse().unwrap()).is_ok());
    }

    #[test]
    fn rejects_negative_price() {
        let err = Price::new("-1.00".parse().unwrap()).unwrap_err();
        assert!(matches!(err, ValidationError::Negative { field: "price" }));
    }

    #[test]
    fn rejects_sub_cent_precision() {
        let err = Price::new("9.999".parse().unwrap()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));
    }

    #[test]
    fn rejects_overflowing_price() {
        let err = Price::new("100000000.00".parse().unwrap()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));
    }
}
