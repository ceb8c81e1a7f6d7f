//! Domain events
use crate::domain::value_objects::{IdempotencyKey, Money, ProductId};

#[derive(Clone, Debug, PartialEq)]
pub enum DomainEvent {
    Cart(CartEvent),
    Order(OrderEvent),
    Loyalty(LoyaltyEvent),
}

#[derive(Clone, Debug, PartialEq)]
pub enum CartEvent {
    ItemsCheckedOut { product_ids: Vec<ProductId> },
    Cleared,
}

#[derive(Clone, Debug, PartialEq)]
pub enum OrderEvent {
    Placed { order_id: i64, total: Money, idempotency_key: IdempotencyKey },
    Rejected { message: String, idempotency_key: IdempotencyKey },
    VoucherConsumed { code: String, order_id: i64 },
}

#[derive(Clone, Debug, PartialEq)]
pub enum LoyaltyEvent {
    PointsRedeemed { customer_id: i64, points_spent: u64, balance: u64, voucher_code: String },
    RedemptionRejected { customer_id: i64, message: String },
}
