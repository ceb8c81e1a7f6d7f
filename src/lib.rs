//! OpenSASE Checkout
//!
//! Client-side commerce core for the storefront app.
//!
//! ## Features
//! - Session cart with selection and promotion gifts
//! - Item-level and cart-level pricing
//! - Address resolution and carrier shipping quotes
//! - Single-shot order submission
//! - Loyalty points to voucher redemption

pub mod address;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod envelope;
pub mod in_flight;
pub mod loyalty;
pub mod pricing;
pub mod services;
pub mod shipping;
pub mod state;

use thiserror::Error;

pub use address::{AddressResolver, ResolvedAddress};
pub use checkout::{CheckoutSession, OrderSubmitter};
pub use config::StorefrontConfig;
pub use loyalty::LoyaltyLedger;
pub use pricing::{CheckoutTotals, PricingEngine};
pub use shipping::{QuoteOutcome, ShippingGateway, ShippingQuote};
pub use state::AppState;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("Please sign in first")]
    AuthRequired,

    #[error("{0}")]
    ValidationError(String),

    #[error("Not enough points: have {available}, need {required}")]
    InsufficientPoints { available: u64, required: u64 },

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("{message}")]
    ServerRejected { status: Option<u16>, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("A request is already in progress")]
    InFlight,
}

impl CheckoutError {
    pub fn validation(msg: impl Into<String>) -> Self { Self::ValidationError(msg.into()) }

    /// Text to put in front of the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::NetworkFailure(_) => "Could not reach the server. Check your connection and try again.".to_string(),
            Self::MalformedResponse(_) => "The server sent an unexpected response. Please try again.".to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_network(&self) -> bool { matches!(self, Self::NetworkFailure(_)) }
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
