//! External collaborators: geography reference data, the carrier's fee
//! endpoint, the order backend and the promotions backend.

pub mod http;
pub mod wire;

use async_trait::async_trait;
use mockall::automock;

use crate::domain::aggregates::{CreateOrderRequest, PlacedOrder, Voucher};
use crate::Result;
use wire::{District, FeeQuote, FeeRequest, Province, RedemptionGrant, RedemptionRequest, Ward};

pub use http::{BackendClient, CarrierClient};

#[automock]
#[async_trait]
pub trait GeographyService: Send + Sync {
    async fn provinces(&self) -> Result<Vec<Province>>;

    async fn districts(&self, province_id: i64) -> Result<Vec<District>>;

    async fn wards(&self, district_id: i64) -> Result<Vec<Ward>>;
}

#[automock]
#[async_trait]
pub trait CarrierService: Send + Sync {
    /// Delivery fee for one parcel.
    async fn shipping_fee(&self, request: &FeeRequest) -> Result<FeeQuote>;
}

#[automock]
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Create one order. Never retried by the client.
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<PlacedOrder>;
}

#[automock]
#[async_trait]
pub trait PromotionService: Send + Sync {
    async fn redeem_points(&self, request: &RedemptionRequest) -> Result<RedemptionGrant>;

    /// Vouchers currently held by the customer.
    async fn customer_vouchers(&self, customer_id: i64) -> Result<Vec<Voucher>>;
}
