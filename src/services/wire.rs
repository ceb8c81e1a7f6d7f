//! Request and response bodies exchanged with the carrier and the backend.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::domain::aggregates::voucher::parse_day;
use crate::domain::aggregates::{Voucher, VoucherValue};
use crate::domain::value_objects::{IdempotencyKey, Money, Percent};

/// `{ code, message, data }` wrapper used by the carrier API.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> { pub data: T }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Province {
    #[serde(rename = "ProvinceID")] pub id: i64,
    #[serde(rename = "ProvinceName")] pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct District {
    #[serde(rename = "DistrictID")] pub id: i64,
    #[serde(rename = "DistrictName")] pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ward {
    #[serde(rename = "WardCode")] pub code: String,
    #[serde(rename = "WardName")] pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeeRequest {
    pub service_type_id: u32,
    /// Declared parcel value, whole currency units.
    pub insurance_value: i64,
    pub coupon: Option<String>,
    pub from_district_id: i64,
    pub from_ward_code: String,
    pub to_district_id: i64,
    pub to_ward_code: String,
    pub height: u32,
    pub length: u32,
    pub weight: u32,
    pub width: u32,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FeeQuote {
    pub total: Decimal,
    #[serde(default)]
    pub service_fee: Option<Decimal>,
    #[serde(default)]
    pub insurance_fee: Option<Decimal>,
}

/// `{ status, message?, orders? }` returned by order creation.
#[derive(Debug, Deserialize)]
pub struct CreateOrderResponse<T> {
    #[serde(default)]
    pub status: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
    pub orders: Option<T>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Validate)]
pub struct RedemptionRequest {
    pub cus_id: i64,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Points this redemption costs.
    #[validate(range(min = 1))]
    pub cus_points: u64,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub value_max: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub value_min: Decimal,
    pub idempotency_key: IdempotencyKey,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RedeemedVoucher {
    pub s_code: String,
    pub s_name: String,
    pub s_value_max: Decimal,
    pub s_value_min: Decimal,
    #[serde(default)]
    pub s_end: Option<String>,
    /// Balance after the debit, when the server reports it alongside the voucher.
    #[serde(default, alias = "cus_points", alias = "diem")]
    pub remaining_points: Option<u64>,
}

/// `{ success, data?, message?, remaining_points? }` returned by redemption.
#[derive(Debug, Deserialize)]
pub struct RedemptionResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Option<RedeemedVoucher>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "cus_points", alias = "points")]
    pub remaining_points: Option<u64>,
}

/// Confirmed redemption: the created voucher and the authoritative balance.
#[derive(Clone, Debug, PartialEq)]
pub struct RedemptionGrant {
    pub voucher: RedeemedVoucher,
    pub remaining_points: Option<u64>,
}

/// Voucher held by a customer, as listed by the promotions backend.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CustomerPromotion {
    pub id: i64,
    pub code: String,
    #[serde(default)]
    pub name: String,
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub max_value: Option<Decimal>,
    #[serde(default)]
    pub min_value: Option<Decimal>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl CustomerPromotion {
    /// `None` when the listed percentage is out of range.
    pub fn into_voucher(self) -> Option<Voucher> {
        let percent = Percent::new(self.discount_percentage).ok()?;
        Some(Voucher {
            code: self.code,
            name: self.name,
            value: VoucherValue::Percent(percent),
            min_spend: self.min_value.map(Money::new).unwrap_or(Money::ZERO),
            max_discount: self.max_value.map(Money::new),
            expires_on: self.end_date.as_deref().and_then(parse_day),
        })
    }
}

/// `{ success, data?, message? }` returned by the customer voucher listing.
#[derive(Debug, Deserialize)]
pub struct PromotionListResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Option<Vec<CustomerPromotion>>,
    #[serde(default)]
    pub message: Option<String>,
}
