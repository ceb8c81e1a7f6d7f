//! OpenSASE Checkout - basket preview and order placement

use anyhow::{bail, Context, Result};
use chrono::Local;
use serde::Deserialize;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opensase_checkout::domain::aggregates::{CartAction, CartItem, CatalogProduct, Customer, PaymentMethod, Voucher};
use opensase_checkout::services::{BackendClient, CarrierClient};
use opensase_checkout::{AddressResolver, AppState, CheckoutSession, LoyaltyLedger, OrderSubmitter, ShippingGateway, StorefrontConfig};

#[derive(Debug, Deserialize)]
struct Basket {
    customer: Customer,
    items: Vec<BasketLine>,
    #[serde(default)]
    wallet: Vec<Voucher>,
    #[serde(default)]
    voucher_code: Option<String>,
    #[serde(default)]
    note: String,
    #[serde(default)]
    payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize)]
struct BasketLine { product: CatalogProduct, quantity: u32 }

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else { bail!("usage: opensase-checkout <basket.json> [--place]") };
    let place = args.any(|a| a == "--place");

    let config = StorefrontConfig::from_env().context("loading configuration")?;
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let basket: Basket = serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?;

    let carrier = Arc::new(CarrierClient::new(&config.carrier, config.request_timeout)?);
    let backend = Arc::new(BackendClient::new(&config)?);
    let resolver = AddressResolver::new(carrier.clone());
    let gateway = ShippingGateway::new(carrier, &config.carrier);
    let ledger = LoyaltyLedger::new(backend.clone());
    let submitter = OrderSubmitter::new(backend, config.order.clone());

    let mut state = AppState::new();
    state.sign_in(basket.customer);
    if basket.wallet.is_empty() {
        if let Err(err) = ledger.refresh_wallet(&mut state).await {
            tracing::warn!(error = %err, "could not load vouchers");
        }
    } else {
        state.load_wallet(basket.wallet);
    }
    for line in &basket.items {
        state.dispatch(CartAction::Add { item: CartItem::from(&line.product), quantity: line.quantity });
    }

    let mut session = CheckoutSession::open(&state)?;
    session.note = basket.note;
    session.payment_method = basket.payment_method;
    if let Some(code) = basket.voucher_code.as_deref() {
        let voucher = state.voucher(code).cloned().with_context(|| format!("voucher {code} is not in the wallet"))?;
        session.apply_voucher(voucher, &state, Local::now().date_naive())?;
    }

    let address = session.resolve_address(&resolver).await.display();
    session.refresh_shipping(&gateway, state.cart()).await;
    if let Some(err) = session.shipping_error() {
        println!("Shipping quote unavailable: {}", err.user_message());
    }

    let totals = session.totals(state.cart()).rounded();
    println!("Deliver to:     {address}");
    for item in state.cart().selected_items() {
        println!("  {} x{:<3} {}", item.name, item.quantity, item.line_total().rounded());
    }
    println!("Subtotal:       {}", totals.list_price);
    println!("Item discounts: -{}", totals.item_discount);
    if !totals.cart_discount.is_zero() { println!("Cart discount:  -{}", totals.cart_discount); }
    if let Some(v) = session.voucher() { println!("Voucher {}: -{}", v.code, totals.voucher_discount); }
    println!("Shipping:       {}", totals.shipping_fee);
    println!("Total:          {}", totals.grand_total);

    if place {
        let receipt = submitter.submit(&mut state, &session).await.map_err(|e| anyhow::anyhow!(e.user_message()))?;
        println!("\n{}", receipt.summary());
    }
    Ok(())
}
