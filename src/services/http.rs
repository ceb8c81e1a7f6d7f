//! reqwest-backed service clients.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::wire::{
    CreateOrderResponse, DataEnvelope, District, FeeQuote, FeeRequest, PromotionListResponse, Province, RedemptionGrant,
    RedemptionRequest, RedemptionResponse, Ward,
};
use super::{CarrierService, GeographyService, OrderService, PromotionService};
use crate::config::{CarrierConfig, StorefrontConfig};
use crate::domain::aggregates::{CreateOrderRequest, PlacedOrder, Voucher};
use crate::{envelope, CheckoutError, Result};

impl From<reqwest::Error> for CheckoutError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() { Self::MalformedResponse(err.to_string()) } else { Self::NetworkFailure(err.to_string()) }
    }
}

fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

async fn read<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status().as_u16();
    let body = response.text().await?;
    debug!(status, bytes = body.len(), "response received");
    envelope::interpret(status, &body)
}

/// Carrier API client: master-data lookups and fee quotes.
#[derive(Debug, Clone)]
pub struct CarrierClient {
    http: Client,
    base_url: String,
    token: String,
    shop_id: Option<String>,
}

impl CarrierClient {
    pub fn new(config: &CarrierConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_client(timeout)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            shop_id: config.shop_id.clone(),
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(format!("{}{path}", self.base_url)).header("token", &self.token)
    }

    async fn list<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>> {
        let envelope: DataEnvelope<Option<Vec<T>>> = read(request.send().await?).await?;
        Ok(envelope.data.unwrap_or_default())
    }
}

#[async_trait]
impl GeographyService for CarrierClient {
    async fn provinces(&self) -> Result<Vec<Province>> {
        self.list(self.get("/master-data/province")).await
    }

    async fn districts(&self, province_id: i64) -> Result<Vec<District>> {
        self.list(self.get("/master-data/district").query(&[("province_id", province_id)])).await
    }

    async fn wards(&self, district_id: i64) -> Result<Vec<Ward>> {
        self.list(self.get("/master-data/ward").query(&[("district_id", district_id)])).await
    }
}

#[async_trait]
impl CarrierService for CarrierClient {
    async fn shipping_fee(&self, request: &FeeRequest) -> Result<FeeQuote> {
        let mut builder = self
            .http
            .post(format!("{}/v2/shipping-order/fee", self.base_url))
            .header("token", &self.token)
            .json(request);
        if let Some(shop_id) = &self.shop_id { builder = builder.header("shop_id", shop_id); }
        let envelope: DataEnvelope<FeeQuote> = read(builder.send().await?).await?;
        Ok(envelope.data)
    }
}

/// Storefront backend client: orders and promotions.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl BackendClient {
    pub fn new(config: &StorefrontConfig) -> Result<Self> {
        Ok(Self {
            http: build_client(config.request_timeout)?,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        })
    }

    fn post(&self, path: &str) -> RequestBuilder { self.authorize(self.http.post(format!("{}{path}", self.base_url))) }
    fn get(&self, path: &str) -> RequestBuilder { self.authorize(self.http.get(format!("{}{path}", self.base_url))) }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("Accept", "application/json");
        match &self.token { Some(token) => builder.bearer_auth(token), None => builder }
    }
}

#[async_trait]
impl OrderService for BackendClient {
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<PlacedOrder> {
        let response = self
            .post("/api/create-order")
            .header("Idempotency-Key", request.idempotency_key.to_string())
            .json(request)
            .send()
            .await?;
        let body: CreateOrderResponse<PlacedOrder> = read(response).await?;
        body.orders.ok_or_else(|| {
            CheckoutError::MalformedResponse(format!(
                "order response without order (status {:?}, message {:?})", body.status, body.message
            ))
        })
    }
}

#[async_trait]
impl PromotionService for BackendClient {
    async fn redeem_points(&self, request: &RedemptionRequest) -> Result<RedemptionGrant> {
        let response = self
            .post("/api/promotions/redeem-point")
            .header("Idempotency-Key", request.idempotency_key.to_string())
            .json(request)
            .send()
            .await?;
        let body: RedemptionResponse = read(response).await?;
        match body.data {
            Some(voucher) => {
                let remaining_points = body.remaining_points.or(voucher.remaining_points);
                Ok(RedemptionGrant { voucher, remaining_points })
            }
            None => Err(CheckoutError::MalformedResponse(
                body.message.unwrap_or_else(|| "redemption response without voucher".to_string()),
            )),
        }
    }

    async fn customer_vouchers(&self, customer_id: i64) -> Result<Vec<Voucher>> {
        let body: PromotionListResponse = read(self.get(&format!("/api/promotions/customer/{customer_id}")).send().await?).await?;
        let listed = body.data.unwrap_or_default();
        let total = listed.len();
        let vouchers: Vec<Voucher> = listed.into_iter().filter_map(|p| p.into_voucher()).collect();
        if vouchers.len() < total {
            warn!(customer_id, skipped = total - vouchers.len(), "skipped vouchers with an invalid percentage");
        }
        Ok(vouchers)
    }
}
