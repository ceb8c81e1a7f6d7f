//! Carrier shipping quotes.
//!
//! Every quote request takes a ticket from a monotonic counter. A response
//! is only applied if its ticket is still the latest issued; anything older
//! comes back as [`QuoteOutcome::Superseded`] and must not touch displayed
//! state.

use rust_decimal::prelude::ToPrimitive;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{CarrierConfig, ParcelSpec, ShopOrigin};
use crate::domain::aggregates::Address;
use crate::domain::value_objects::Money;
use crate::services::wire::FeeRequest;
use crate::services::CarrierService;
use crate::{CheckoutError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShippingQuote {
    pub fee: Money,
    pub carrier_service_id: u32,
    /// Stand-in after a failed quote; the user may still proceed.
    pub placeholder: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum QuoteOutcome {
    Applied(ShippingQuote),
    Superseded { ticket: u64 },
    Failed { error: CheckoutError, fallback: ShippingQuote },
}

impl QuoteOutcome {
    /// The quote to display, or `None` when this outcome must be ignored.
    pub fn displayable(&self) -> Option<ShippingQuote> {
        match self {
            Self::Applied(q) => Some(*q),
            Self::Failed { fallback, .. } => Some(*fallback),
            Self::Superseded { .. } => None,
        }
    }
}

pub struct ShippingGateway {
    carrier: Arc<dyn CarrierService>,
    origin: ShopOrigin,
    parcel: ParcelSpec,
    service_type_id: u32,
    issued: AtomicU64,
}

impl ShippingGateway {
    pub fn new(carrier: Arc<dyn CarrierService>, config: &CarrierConfig) -> Self {
        Self {
            carrier,
            origin: config.origin.clone(),
            parcel: config.parcel,
            service_type_id: config.service_type_id,
            issued: AtomicU64::new(0),
        }
    }

    /// Ticket of the most recently issued request.
    pub fn latest_ticket(&self) -> u64 { self.issued.load(Ordering::Acquire) }

    /// Invalidate every in-flight request, e.g. when leaving checkout.
    pub fn abandon(&self) {
        let ticket = self.issued.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(ticket, "abandoned in-flight shipping quotes");
    }

    pub fn fee_request(&self, destination: &Address, declared_value: Money) -> Result<FeeRequest> {
        let (Some(to_district_id), Some(to_ward_code)) = (destination.district_id, destination.ward_code.as_deref().map(str::trim))
        else {
            return Err(CheckoutError::validation("Please complete your delivery address before checkout"));
        };
        if to_ward_code.is_empty() {
            return Err(CheckoutError::validation("Please complete your delivery address before checkout"));
        }
        let insurance_value = declared_value
            .rounded()
            .amount()
            .to_i64()
            .filter(|v| *v >= 0)
            .ok_or_else(|| CheckoutError::validation("Declared parcel value out of range"))?;
        Ok(FeeRequest {
            service_type_id: self.service_type_id,
            insurance_value,
            coupon: None,
            from_district_id: self.origin.district_id,
            from_ward_code: self.origin.ward_code.clone(),
            to_district_id,
            to_ward_code: to_ward_code.to_string(),
            height: self.parcel.height,
            length: self.parcel.length,
            weight: self.parcel.weight,
            width: self.parcel.width,
        })
    }

    /// Quote delivery of the standard parcel to `destination`, insured for `declared_value`.
    pub async fn quote(&self, destination: &Address, declared_value: Money) -> QuoteOutcome {
        let ticket = self.issued.fetch_add(1, Ordering::AcqRel) + 1;
        let result = match self.fee_request(destination, declared_value) {
            Ok(request) => {
                debug!(ticket, to_district = request.to_district_id, insurance_value = request.insurance_value, "requesting shipping quote");
                self.carrier.shipping_fee(&request).await.map(|q| Money::new(q.total))
            }
            Err(err) => Err(err),
        };
        self.settle(ticket, result)
    }

    fn settle(&self, ticket: u64, result: Result<Money>) -> QuoteOutcome {
        let latest = self.latest_ticket();
        if ticket != latest {
            debug!(ticket, latest, "discarding superseded shipping quote");
            return QuoteOutcome::Superseded { ticket };
        }
        match result {
            Ok(fee) => {
                info!(ticket, %fee, "shipping quote applied");
                QuoteOutcome::Applied(ShippingQuote { fee, carrier_service_id: self.service_type_id, placeholder: false })
            }
            Err(error) => {
                warn!(ticket, %error, "shipping quote failed; using placeholder fee");
                let fallback = ShippingQuote { fee: Money::ZERO, carrier_service_id: self.service_type_id, placeholder: true };
                QuoteOutcome::Failed { error, fallback }
            }
        }
    }
}

impl std::fmt::Debug for ShippingGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShippingGateway")
            .field("origin", &self.origin)
            .field("service_type_id", &self.service_type_id)
            .field("issued", &self.latest_ticket())
            .finish_non_exhaustive()
    }
}
