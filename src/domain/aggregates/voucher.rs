//! Voucher Aggregate

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::domain::value_objects::{Money, Percent};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoucherValue { Percent(Percent), Fixed(Money) }

/// A spendable voucher, held in the customer's wallet until an order uses it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    pub code: String,
    pub name: String,
    pub value: VoucherValue,
    pub min_spend: Money,
    pub max_discount: Option<Money>,
    /// Last valid day, inclusive.
    pub expires_on: Option<NaiveDate>,
}

impl Voucher {
    pub fn check(&self, subtotal: Money, today: NaiveDate) -> Result<(), VoucherError> {
        if self.expires_on.is_some_and(|end| today > end) { return Err(VoucherError::Expired); }
        if subtotal < self.min_spend { return Err(VoucherError::BelowMinSpend { min_spend: self.min_spend }); }
        Ok(())
    }

    /// Reduction this voucher grants on `subtotal`, capped and never above the subtotal.
    pub fn discount_for(&self, subtotal: Money) -> Money {
        let raw = match self.value {
            VoucherValue::Percent(p) => subtotal.percent_of(p),
            VoucherValue::Fixed(m) => m,
        };
        let capped = match self.max_discount { Some(max) => raw.min(max), None => raw };
        capped.min(subtotal)
    }
}

/// Redemption catalog entry: what a number of points buys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct VoucherDefinition {
    pub percent: Percent,
    pub max_discount: Money,
    pub min_spend: Money,
    #[validate(range(min = 1))]
    pub points_required: u64,
}

impl VoucherDefinition {
    pub fn new(percent: u32, max_discount: i64, min_spend: i64, points_required: u64) -> Result<Self, VoucherError> {
        let percent = Percent::whole(percent).map_err(|_| VoucherError::InvalidDefinition)?;
        let def = Self { percent, max_discount: Money::from_units(max_discount), min_spend: Money::from_units(min_spend), points_required };
        def.validate().map_err(|_| VoucherError::InvalidDefinition)?;
        Ok(def)
    }

    pub fn display_name(&self) -> String {
        format!("{} off, up to {}", self.percent, self.max_discount)
    }

    /// Built-in redemption catalog.
    pub fn catalog() -> Vec<VoucherDefinition> {
        [(5, 20_000, 100_000, 25), (10, 50_000, 200_000, 40), (15, 100_000, 300_000, 50)]
            .into_iter()
            .filter_map(|(p, max, min, pts)| Self::new(p, max, min, pts).ok())
            .collect()
    }

    pub fn affordable_with(&self, points: u64) -> bool { points >= self.points_required }
}

/// Voucher granted by the server, combined with the definition it was redeemed from.
pub(crate) fn voucher_from_grant(
    code: String, name: String, value_max: Decimal, value_min: Decimal, end: Option<&str>, def: &VoucherDefinition,
) -> Voucher {
    Voucher {
        code,
        name,
        value: VoucherValue::Percent(def.percent),
        min_spend: Money::new(value_min),
        max_discount: Some(Money::new(value_max)),
        expires_on: end.and_then(parse_day),
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and RFC 3339.
pub(crate) fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok().map(|d| d.date()))
        .or_else(|| chrono::DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive()))
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum VoucherError { Expired, BelowMinSpend { min_spend: Money }, InvalidDefinition }
impl std::error::Error for VoucherError {}
impl std::fmt::Display for VoucherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expired => write!(f, "Voucher has expired"),
            Self::BelowMinSpend { min_spend } => write!(f, "Order must be at least {min_spend} to use this voucher"),
            Self::InvalidDefinition => write!(f, "Invalid voucher definition"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate { NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap() }

    fn ten_percent() -> Voucher {
        Voucher {
            code: "XTRA10".into(), name: "10% off".into(), value: VoucherValue::Percent(Percent::whole(10).unwrap()),
            min_spend: Money::from_units(200_000), max_discount: Some(Money::from_units(50_000)), expires_on: Some(day("2026-12-31")),
        }
    }

    #[test]
    fn test_voucher_validity() {
        let v = ten_percent();
        assert_eq!(v.check(Money::from_units(250_000), day("2026-12-31")), Ok(()));
        assert_eq!(v.check(Money::from_units(250_000), day("2027-01-01")), Err(VoucherError::Expired));
        assert!(matches!(v.check(Money::from_units(199_999), day("2026-06-01")), Err(VoucherError::BelowMinSpend { .. })));
    }

    #[test]
    fn test_voucher_discount_is_capped() {
        let v = ten_percent();
        assert_eq!(v.discount_for(Money::from_units(300_000)), Money::from_units(30_000));
        assert_eq!(v.discount_for(Money::from_units(900_000)), Money::from_units(50_000));
    }

    #[test]
    fn test_catalog() {
        let catalog = VoucherDefinition::catalog();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog[0].points_required, 25);
        assert!(!catalog[0].affordable_with(20));
        assert!(catalog[2].affordable_with(50));
        assert_eq!(VoucherDefinition::new(5, 1, 1, 0), Err(VoucherError::InvalidDefinition));
    }

    #[test]
    fn test_parse_day_formats() {
        assert_eq!(parse_day("2024-11-30"), Some(day("2024-11-30")));
        assert_eq!(parse_day("2024-11-30 23:59:59"), Some(day("2024-11-30")));
        assert_eq!(parse_day("2024-11-30T10:00:00+07:00"), Some(day("2024-11-30")));
        assert_eq!(parse_day("soon"), None);
    }
}
