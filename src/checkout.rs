//! Checkout: the payment-screen session and single-shot order submission.

use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::{info, warn};

use crate::address::{AddressResolver, ResolvedAddress};
use crate::config::{ClearPolicy, OrderConfig};
use crate::domain::aggregates::{
    Address, Cart, CartAction, CreateOrderRequest, OrderLine, OrderReceipt, PaymentMethod, Voucher,
};
use crate::domain::events::{CartEvent, DomainEvent, OrderEvent};
use crate::domain::value_objects::{IdempotencyKey, Money, ProductId};
use crate::in_flight::InFlight;
use crate::pricing::{CheckoutTotals, PricingEngine};
use crate::services::OrderService;
use crate::shipping::{QuoteOutcome, ShippingGateway, ShippingQuote};
use crate::state::AppState;
use crate::{CheckoutError, Result};

/// State of one visit to the payment screen.
///
/// The idempotency key lives as long as the session, so re-tapping
/// "place order" after a failure resends the same key.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    address: Address,
    resolved: Option<ResolvedAddress>,
    shipping: Option<ShippingQuote>,
    shipping_error: Option<CheckoutError>,
    quoted_for: Option<(Address, Money)>,
    voucher: Option<Voucher>,
    pub note: String,
    pub payment_method: PaymentMethod,
    idempotency_key: IdempotencyKey,
}

impl CheckoutSession {
    /// Snapshot the signed-in customer's address.
    pub fn open(state: &AppState) -> Result<Self> {
        let customer = state.customer().ok_or(CheckoutError::AuthRequired)?;
        Ok(Self {
            address: customer.address.clone(),
            resolved: None,
            shipping: None,
            shipping_error: None,
            quoted_for: None,
            voucher: None,
            note: String::new(),
            payment_method: PaymentMethod::default(),
            idempotency_key: IdempotencyKey::generate(),
        })
    }

    pub fn address(&self) -> &Address { &self.address }
    pub fn resolved_address(&self) -> Option<&ResolvedAddress> { self.resolved.as_ref() }
    pub fn shipping_quote(&self) -> Option<&ShippingQuote> { self.shipping.as_ref() }
    pub fn shipping_error(&self) -> Option<&CheckoutError> { self.shipping_error.as_ref() }
    pub fn voucher(&self) -> Option<&Voucher> { self.voucher.as_ref() }
    pub fn idempotency_key(&self) -> &IdempotencyKey { &self.idempotency_key }

    /// Quoted fee, or zero while no quote has landed or after a failed one.
    pub fn shipping_fee(&self) -> Money { self.shipping.map(|q| q.fee).unwrap_or(Money::ZERO) }

    pub async fn resolve_address(&mut self, resolver: &AddressResolver) -> &ResolvedAddress {
        self.resolved.insert(resolver.resolve(&self.address).await)
    }

    /// True when the destination or the declared value moved since the last applied quote.
    pub fn needs_quote(&self, cart: &Cart) -> bool {
        let declared = PricingEngine::declared_value(cart);
        self.quoted_for.as_ref() != Some(&(self.address.clone(), declared))
    }

    pub async fn refresh_shipping(&mut self, gateway: &ShippingGateway, cart: &Cart) -> QuoteOutcome {
        let declared = PricingEngine::declared_value(cart);
        let outcome = gateway.quote(&self.address, declared).await;
        self.apply_quote(&outcome, declared);
        outcome
    }

    /// Superseded outcomes leave the displayed quote as it was.
    pub fn apply_quote(&mut self, outcome: &QuoteOutcome, declared: Money) {
        let Some(quote) = outcome.displayable() else { return };
        self.shipping = Some(quote);
        self.shipping_error = match outcome { QuoteOutcome::Failed { error, .. } => Some(error.clone()), _ => None };
        self.quoted_for = Some((self.address.clone(), declared));
    }

    pub fn apply_voucher(&mut self, voucher: Voucher, state: &AppState, today: NaiveDate) -> Result<()> {
        if state.is_voucher_spent(&voucher.code) {
            return Err(CheckoutError::validation("This voucher has already been used"));
        }
        voucher
            .check(PricingEngine::calculate_total(state.cart()), today)
            .map_err(|e| CheckoutError::validation(e.to_string()))?;
        self.voucher = Some(voucher);
        Ok(())
    }

    pub fn remove_voucher(&mut self) -> Option<Voucher> { self.voucher.take() }

    pub fn totals(&self, cart: &Cart) -> CheckoutTotals {
        PricingEngine::checkout_totals(cart, self.voucher.as_ref(), self.shipping_fee())
    }

    /// Leave checkout: in-flight quotes will be discarded when they land.
    pub fn abandon(self, gateway: &ShippingGateway) { gateway.abandon(); }
}

/// Turns a confirmed checkout into exactly one order-creation request.
pub struct OrderSubmitter {
    orders: Arc<dyn OrderService>,
    config: OrderConfig,
    in_flight: InFlight,
}

impl OrderSubmitter {
    pub fn new(orders: Arc<dyn OrderService>, config: OrderConfig) -> Self {
        Self { orders, config, in_flight: InFlight::new() }
    }

    pub fn is_submitting(&self) -> bool { self.in_flight.is_pending() }

    /// Validate and assemble the order payload without touching the network.
    pub fn build_request(&self, state: &AppState, session: &CheckoutSession, today: NaiveDate) -> Result<CreateOrderRequest> {
        let customer = state.customer().ok_or(CheckoutError::AuthRequired)?;
        let cart = state.cart();
        let lines: Vec<OrderLine> = cart.selected_items().map(OrderLine::from).collect();
        if lines.is_empty() {
            return Err(CheckoutError::validation("Please select at least one item"));
        }
        if let Some(bad) = cart.selected_items().find(|i| i.quantity == 0) {
            return Err(CheckoutError::validation(format!("Invalid quantity for {}", bad.name)));
        }

        let totals = session.totals(cart);
        let voucher_code = match session.voucher() {
            Some(v) if state.is_voucher_spent(&v.code) => {
                return Err(CheckoutError::validation("This voucher has already been used"));
            }
            Some(v) => {
                v.check(totals.merchandise, today).map_err(|e| CheckoutError::validation(e.to_string()))?;
                Some(v.code.clone())
            }
            None => None,
        };
        let shipping_fee = match session.shipping_quote() {
            Some(_) if session.needs_quote(cart) => {
                return Err(CheckoutError::validation("Shipping fee is out of date, please wait for a new quote"));
            }
            Some(q) if !q.placeholder => Some(q.fee.rounded().amount()),
            _ => None,
        };
        let note = session.note.trim();

        Ok(CreateOrderRequest {
            customer_id: customer.id,
            pays_id: self.config.pays_id,
            status: self.config.initial_status,
            products: lines,
            shipping_fee,
            discount: voucher_code.as_ref().map(|_| totals.voucher_discount.rounded().amount()),
            voucher_code,
            note: (!note.is_empty()).then(|| note.to_string()),
            payment_method: Some(session.payment_method),
            idempotency_key: session.idempotency_key().clone(),
        })
    }

    /// Submit the selected lines. The cart changes only after the server confirms.
    pub async fn submit(&self, state: &mut AppState, session: &CheckoutSession) -> Result<OrderReceipt> {
        let request = self.build_request(state, session, Local::now().date_naive())?;
        let _pending = self.in_flight.try_begin().ok_or(CheckoutError::InFlight)?;
        let submitted: Vec<ProductId> = request.products.iter().map(|l| l.product_id).collect();

        info!(customer_id = request.customer_id, lines = submitted.len(), key = %request.idempotency_key, "submitting order");
        let placed = match self.orders.create_order(&request).await {
            Ok(placed) => placed,
            Err(err) => {
                warn!(customer_id = request.customer_id, error = %err, "order rejected; cart left as is");
                state.raise(DomainEvent::Order(OrderEvent::Rejected {
                    message: err.user_message(),
                    idempotency_key: request.idempotency_key.clone(),
                }));
                return Err(err);
            }
        };

        let receipt = OrderReceipt::new(placed, session.payment_method, request.idempotency_key.clone());
        info!(order_id = receipt.order_id, total = %receipt.total, "order placed");

        match self.config.clear_policy {
            ClearPolicy::EntireCart => {
                state.dispatch(CartAction::Clear);
                state.raise(DomainEvent::Cart(CartEvent::Cleared));
            }
            ClearPolicy::SubmittedItems => {
                for id in &submitted { state.dispatch(CartAction::Remove(*id)); }
                state.raise(DomainEvent::Cart(CartEvent::ItemsCheckedOut { product_ids: submitted }));
            }
        }
        if let Some(code) = &request.voucher_code {
            state.spend_voucher(code);
            state.raise(DomainEvent::Order(OrderEvent::VoucherConsumed { code: code.clone(), order_id: receipt.order_id }));
        }
        state.raise(DomainEvent::Order(OrderEvent::Placed {
            order_id: receipt.order_id,
            total: receipt.total,
            idempotency_key: request.idempotency_key,
        }));
        Ok(receipt)
    }
}

impl std::fmt::Debug for OrderSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderSubmitter").field("config", &self.config).field("in_flight", &self.in_flight).finish_non_exhaustive()
    }
}
