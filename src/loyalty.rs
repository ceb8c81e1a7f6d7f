//! Loyalty points and their redemption for vouchers.
//!
//! The local balance is never debited optimistically. It changes only once
//! the server has confirmed the redemption.

use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::domain::aggregates::voucher::voucher_from_grant;
use crate::domain::aggregates::{Voucher, VoucherDefinition};
use crate::domain::events::{DomainEvent, LoyaltyEvent};
use crate::domain::value_objects::IdempotencyKey;
use crate::in_flight::InFlight;
use crate::services::wire::RedemptionRequest;
use crate::services::PromotionService;
use crate::state::AppState;
use crate::{CheckoutError, Result};

/// One user-initiated redemption. Retrying the same attempt reuses its key.
#[derive(Clone, Debug, PartialEq)]
pub struct RedemptionAttempt {
    pub definition: VoucherDefinition,
    key: IdempotencyKey,
}

impl RedemptionAttempt {
    pub fn new(definition: VoucherDefinition) -> Self { Self { definition, key: IdempotencyKey::generate() } }
    pub fn idempotency_key(&self) -> &IdempotencyKey { &self.key }
}

/// A catalog entry as shown on the redeem screen.
#[derive(Clone, Debug, PartialEq)]
pub struct Offer {
    pub definition: VoucherDefinition,
    pub affordable: bool,
}

pub struct LoyaltyLedger {
    promotions: Arc<dyn PromotionService>,
    in_flight: InFlight,
}

impl LoyaltyLedger {
    pub fn new(promotions: Arc<dyn PromotionService>) -> Self { Self { promotions, in_flight: InFlight::new() } }

    pub fn is_redeeming(&self) -> bool { self.in_flight.is_pending() }

    /// Current balance of the signed-in customer.
    pub fn balance(state: &AppState) -> Result<u64> {
        state.customer().map(|c| c.points()).ok_or(CheckoutError::AuthRequired)
    }

    /// The redemption catalog, flagged against the current balance.
    pub fn offers(state: &AppState) -> Vec<Offer> {
        let points = state.customer().map(|c| c.points()).unwrap_or(0);
        VoucherDefinition::catalog()
            .into_iter()
            .map(|definition| Offer { affordable: definition.affordable_with(points), definition })
            .collect()
    }

    /// Reload the signed-in customer's wallet from the backend. Vouchers already spent here stay out.
    pub async fn refresh_wallet(&self, state: &mut AppState) -> Result<usize> {
        let customer_id = state.customer().map(|c| c.id).ok_or(CheckoutError::AuthRequired)?;
        let vouchers = self.promotions.customer_vouchers(customer_id).await?;
        state.load_wallet(vouchers);
        info!(customer_id, vouchers = state.wallet().len(), "wallet loaded");
        Ok(state.wallet().len())
    }

    pub async fn redeem(&self, state: &mut AppState, attempt: &RedemptionAttempt) -> Result<Voucher> {
        let customer = state.customer().ok_or(CheckoutError::AuthRequired)?;
        let (customer_id, available) = (customer.id, customer.points());
        let definition = &attempt.definition;
        if !definition.affordable_with(available) {
            return Err(CheckoutError::InsufficientPoints { available, required: definition.points_required });
        }

        let request = RedemptionRequest {
            cus_id: customer_id,
            name: definition.display_name(),
            cus_points: definition.points_required,
            description: format!(
                "{} off orders from {}, up to {}",
                definition.percent, definition.min_spend, definition.max_discount
            ),
            value_max: definition.max_discount.amount(),
            value_min: definition.min_spend.amount(),
            idempotency_key: attempt.key.clone(),
        };
        request.validate().map_err(|e| CheckoutError::validation(e.to_string()))?;

        let _pending = self.in_flight.try_begin().ok_or(CheckoutError::InFlight)?;
        info!(customer_id, points = request.cus_points, key = %request.idempotency_key, "redeeming points");
        let grant = match self.promotions.redeem_points(&request).await {
            Ok(grant) => grant,
            Err(err) => {
                warn!(customer_id, error = %err, "redemption rejected; balance unchanged");
                state.raise(DomainEvent::Loyalty(LoyaltyEvent::RedemptionRejected { customer_id, message: err.user_message() }));
                return Err(err);
            }
        };

        let balance = match grant.remaining_points {
            Some(balance) => balance,
            None => {
                let balance = available.saturating_sub(definition.points_required);
                warn!(customer_id, balance, "server did not report a balance; deducting locally");
                balance
            }
        };
        let granted = grant.voucher;
        let voucher = voucher_from_grant(
            granted.s_code, granted.s_name, granted.s_value_max, granted.s_value_min, granted.s_end.as_deref(), definition,
        );

        if let Some(customer) = state.customer_mut() { customer.adopt_points(balance); }
        state.add_voucher(voucher.clone());
        state.raise(DomainEvent::Loyalty(LoyaltyEvent::PointsRedeemed {
            customer_id,
            points_spent: definition.points_required,
            balance,
            voucher_code: voucher.code.clone(),
        }));
        info!(customer_id, balance, code = %voucher.code, "points redeemed");
        Ok(voucher)
    }
}

impl std::fmt::Debug for LoyaltyLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoyaltyLedger").field("in_flight", &self.in_flight).finish_non_exhaustive()
    }
}
