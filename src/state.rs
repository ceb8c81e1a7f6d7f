//! Application state owned by a single context.
//!
//! The cart changes only through [`CartAction`]s; the point balance changes
//! only through a confirmed redemption in [`crate::loyalty`].

use std::collections::HashSet;
use tracing::debug;

use crate::domain::aggregates::{Cart, CartAction, Customer, Voucher};
use crate::domain::events::DomainEvent;

#[derive(Debug, Default)]
pub struct AppState {
    customer: Option<Customer>,
    cart: Cart,
    wallet: Vec<Voucher>,
    spent_vouchers: HashSet<String>,
    events: Vec<DomainEvent>,
}

impl AppState {
    pub fn new() -> Self { Self::default() }

    pub fn customer(&self) -> Option<&Customer> { self.customer.as_ref() }
    pub fn is_authenticated(&self) -> bool { self.customer.is_some() }
    pub fn cart(&self) -> &Cart { &self.cart }
    pub fn wallet(&self) -> &[Voucher] { &self.wallet }

    pub fn sign_in(&mut self, customer: Customer) {
        if self.customer.as_ref().map(|c| c.id) != Some(customer.id) {
            self.wallet.clear();
            self.spent_vouchers.clear();
        }
        self.customer = Some(customer);
    }

    pub fn sign_out(&mut self) {
        self.customer = None;
        self.wallet.clear();
        self.spent_vouchers.clear();
    }

    pub fn dispatch(&mut self, action: CartAction) {
        debug!(?action, "cart action");
        self.cart = std::mem::take(&mut self.cart).reduce(action);
    }

    /// Replace the wallet with vouchers listed by the backend, minus any already spent here.
    pub fn load_wallet(&mut self, vouchers: Vec<Voucher>) {
        self.wallet = vouchers.into_iter().filter(|v| !self.spent_vouchers.contains(&v.code)).collect();
    }

    pub fn voucher(&self, code: &str) -> Option<&Voucher> { self.wallet.iter().find(|v| v.code == code) }
    pub fn is_voucher_spent(&self, code: &str) -> bool { self.spent_vouchers.contains(code) }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }

    pub(crate) fn customer_mut(&mut self) -> Option<&mut Customer> { self.customer.as_mut() }
    pub(crate) fn add_voucher(&mut self, voucher: Voucher) { self.wallet.push(voucher); }

    pub(crate) fn spend_voucher(&mut self, code: &str) {
        self.wallet.retain(|v| v.code != code);
        self.spent_vouchers.insert(code.to_string());
    }

    pub(crate) fn raise(&mut self, event: DomainEvent) { self.events.push(event); }
}
