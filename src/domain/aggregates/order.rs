//! Order Aggregate
//!
//! The client never mutates an order after creation; it only builds the
//! creation request and reads back what the server assigned.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use crate::domain::aggregates::cart::CartItem;
use crate::domain::aggregates::voucher::parse_day;
use crate::domain::value_objects::{IdempotencyKey, Money, ProductId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod { #[default] Cod, BankTransfer, EWallet }

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Cod => "cod", Self::BankTransfer => "bank_transfer", Self::EWallet => "e_wallet" }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cod" => Ok(Self::Cod),
            "bank" | "bank_transfer" => Ok(Self::BankTransfer),
            "wallet" | "e_wallet" => Ok(Self::EWallet),
            other => Err(format!("unknown payment method '{other}'")),
        }
    }
}

/// Order line as the backend expects it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    #[serde(rename = "soluong")]
    pub quantity: u32,
    #[serde(rename = "dongia", with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    /// Absolute currency amount the item discount took off, for the server's records.
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
}

impl From<&CartItem> for OrderLine {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.id,
            quantity: item.quantity,
            unit_price: item.unit_price.amount(),
            discount: item.discount_amount().round_dp(2).amount(),
        }
    }
}

/// Body of the order-creation request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CreateOrderRequest {
    pub customer_id: i64,
    pub pays_id: i64,
    pub status: i64,
    pub products: Vec<OrderLine>,
    #[serde(rename = "shippingFee", with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub shipping_fee: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher_code: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub discount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(rename = "paymentMethod", skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    pub idempotency_key: IdempotencyKey,
}

/// Order as echoed back by the server on success.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PlacedOrder {
    pub id: i64,
    pub or_date: String,
    pub or_total: Decimal,
    #[serde(default)]
    pub or_ship: Option<Decimal>,
    #[serde(default, deserialize_with = "status_history")]
    pub or_status: Vec<String>,
    #[serde(default)]
    pub or_note: Option<String>,
    #[serde(default)]
    pub customer: Option<OrderCustomer>,
    #[serde(default)]
    pub payment: Option<OrderPayment>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct OrderCustomer {
    #[serde(default)] pub cus_name: String,
    #[serde(default)] pub cus_sdt: String,
    #[serde(default)] pub cus_address: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct OrderPayment { pub pa_type: String }

/// `or_status` comes as a single value or a history list; normalize to a list, oldest first.
fn status_history<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    fn flatten(v: serde_json::Value, out: &mut Vec<String>) {
        match v {
            serde_json::Value::Null => {}
            serde_json::Value::String(s) => out.push(s),
            serde_json::Value::Number(n) => out.push(n.to_string()),
            serde_json::Value::Array(items) => items.into_iter().for_each(|i| flatten(i, out)),
            serde_json::Value::Object(mut map) => {
                if let Some(inner) = map.remove("status").or_else(|| map.remove("name")) { flatten(inner, out); }
            }
            serde_json::Value::Bool(b) => out.push(b.to_string()),
        }
    }
    let mut out = Vec::new();
    flatten(serde_json::Value::deserialize(d)?, &mut out);
    Ok(out)
}

/// Confirmation view model shown after a successful order.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderReceipt {
    pub order_id: i64,
    pub placed_on: Option<NaiveDate>,
    pub total: Money,
    pub shipping_fee: Money,
    pub payment_method: String,
    pub status: Vec<String>,
    pub recipient: OrderCustomer,
    pub idempotency_key: IdempotencyKey,
}

impl OrderReceipt {
    pub fn new(order: PlacedOrder, requested_payment: PaymentMethod, key: IdempotencyKey) -> Self {
        Self {
            order_id: order.id,
            placed_on: parse_day(&order.or_date),
            total: Money::new(order.or_total),
            shipping_fee: order.or_ship.map(Money::new).unwrap_or(Money::ZERO),
            payment_method: order.payment.map(|p| p.pa_type).unwrap_or_else(|| requested_payment.as_str().to_string()),
            status: order.or_status,
            recipient: order.customer.unwrap_or_default(),
            idempotency_key: key,
        }
    }

    pub fn summary(&self) -> String {
        let date = self.placed_on.map(|d| d.format("%d/%m/%Y").to_string()).unwrap_or_default();
        format!(
            "Order #{}\nPlaced: {}\nTotal: {}\nShipping: {}\nPayment: {}\nDeliver to: {} ({}) {}",
            self.order_id, date, self.total, self.shipping_fee, self.payment_method,
            self.recipient.cus_name, self.recipient.cus_sdt, self.recipient.cus_address,
        )
    }
}
