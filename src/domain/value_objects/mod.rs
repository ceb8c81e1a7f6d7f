//! Value Objects for checkout

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use uuid::Uuid;

/// Catalog product identifier, unique within a cart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Money value object in the shop currency (VND).
///
/// Arithmetic is exact; rounding to the currency unit happens only through
/// [`Money::rounded`], at display and submission boundaries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self { Self(amount) }
    pub fn from_units(units: i64) -> Self { Self(Decimal::from(units)) }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn is_zero(&self) -> bool { self.0.is_zero() }
    pub fn multiply(&self, qty: u32) -> Money { Money(self.0 * Decimal::from(qty)) }

    /// Portion of this amount that `percent` represents.
    pub fn percent_of(&self, percent: Percent) -> Money { Money(self.0 * percent.fraction()) }

    /// This amount with `percent` taken off.
    pub fn less_percent(&self, percent: Percent) -> Money { Money(self.0 * (Decimal::ONE - percent.fraction())) }

    /// Subtraction floored at zero.
    pub fn saturating_sub(self, other: Money) -> Money {
        if other.0 >= self.0 { Money::ZERO } else { Money(self.0 - other.0) }
    }

    /// Nearest whole currency unit, halves away from zero.
    pub fn rounded(&self) -> Money { Money(self.0.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)) }

    pub fn round_dp(&self, dp: u32) -> Money { Money(self.0.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)) }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money { Money(self.0 + rhs.0) }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money { Money(self.0 - rhs.0) }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money { iter.fold(Money::ZERO, |acc, m| acc + m) }
}

impl fmt::Display for Money {
    /// vi-VN style: `230.000 ₫`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = self.rounded().0.abs().trunc().to_string();
        let mut grouped = String::with_capacity(units.len() + units.len() / 3);
        for (i, ch) in units.chars().enumerate() {
            if i > 0 && (units.len() - i) % 3 == 0 { grouped.push('.'); }
            grouped.push(ch);
        }
        let sign = if self.0.is_sign_negative() && !self.rounded().is_zero() { "-" } else { "" };
        write!(f, "{sign}{grouped} ₫")
    }
}

/// Percentage in `0..=100`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percent(Decimal);

impl Percent {
    pub const ZERO: Percent = Percent(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, PercentError> {
        if value.is_sign_negative() { return Err(PercentError::Negative); }
        if value > Decimal::ONE_HUNDRED { return Err(PercentError::AboveHundred); }
        Ok(Self(value))
    }
    pub fn whole(value: u32) -> Result<Self, PercentError> { Self::new(Decimal::from(value)) }
    pub fn value(&self) -> Decimal { self.0 }
    pub fn fraction(&self) -> Decimal { self.0 / Decimal::ONE_HUNDRED }
    pub fn is_zero(&self) -> bool { self.0.is_zero() }
}

impl TryFrom<Decimal> for Percent {
    type Error = PercentError;
    fn try_from(value: Decimal) -> Result<Self, Self::Error> { Percent::new(value) }
}

impl From<Percent> for Decimal {
    fn from(p: Percent) -> Decimal { p.0 }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}%", self.0.normalize()) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum PercentError { Negative, AboveHundred }
impl std::error::Error for PercentError {}
impl fmt::Display for PercentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Negative => write!(f, "Percent is negative"), Self::AboveHundred => write!(f, "Percent above 100") }
    }
}

/// Client-generated key the backend dedupes submissions on.
///
/// One key per checkout or redemption attempt; user-initiated retries of the
/// same attempt reuse it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(Uuid);

impl IdempotencyKey {
    pub fn generate() -> Self { Self(Uuid::now_v7()) }
    pub fn as_uuid(&self) -> &Uuid { &self.0 }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_bounds() {
        assert_eq!(Percent::new(Decimal::new(-1, 0)), Err(PercentError::Negative));
        assert_eq!(Percent::whole(101), Err(PercentError::AboveHundred));
        assert_eq!(Percent::whole(10).unwrap().fraction(), Decimal::new(1, 1));
    }

    #[test]
    fn test_money_percent() {
        let price = Money::from_units(100_000);
        let ten = Percent::whole(10).unwrap();
        assert_eq!(price.less_percent(ten), Money::from_units(90_000));
        assert_eq!(price.percent_of(ten), Money::from_units(10_000));
    }

    #[test]
    fn test_money_rounding_only_on_request() {
        let third = Money::new(Decimal::new(100_000, 0) / Decimal::from(3));
        assert_ne!(third, Money::from_units(33_333));
        assert_eq!(third.rounded(), Money::from_units(33_333));
        assert_eq!(Money::new(Decimal::new(15, 1)).rounded(), Money::from_units(2));
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_units(230_000).to_string(), "230.000 ₫");
        assert_eq!(Money::from_units(1_250_500).to_string(), "1.250.500 ₫");
        assert_eq!(Money::ZERO.to_string(), "0 ₫");
        assert_eq!(Money::from_units(999).to_string(), "999 ₫");
    }

    #[test]
    fn test_saturating_sub() {
        assert_eq!(Money::from_units(10).saturating_sub(Money::from_units(30)), Money::ZERO);
        assert_eq!(Money::from_units(30).saturating_sub(Money::from_units(10)), Money::from_units(20));
    }

    #[test]
    fn test_percent_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Percent>("150").is_err());
        assert_eq!(serde_json::from_str::<Percent>("15").unwrap(), Percent::whole(15).unwrap());
    }
}
