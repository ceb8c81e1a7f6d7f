//! Runtime configuration, read from the environment (and `.env` when present).

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use validator::Validate;

/// What a successful order removes from the cart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClearPolicy {
    /// Only the lines that went into the order; unselected lines stay.
    #[default]
    SubmittedItems,
    EntireCart,
}

impl FromStr for ClearPolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "submitted" | "selected" => Ok(Self::SubmittedItems),
            "all" | "entire" => Ok(Self::EntireCart),
            other => Err(format!("expected 'submitted' or 'all', got '{other}'")),
        }
    }
}

/// Where parcels ship from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShopOrigin {
    pub province_id: i64,
    pub district_id: i64,
    pub ward_code: String,
}

impl Default for ShopOrigin {
    fn default() -> Self { Self { province_id: 202, district_id: 3695, ward_code: "90737".to_string() } }
}

/// Standard box every quote is priced for, regardless of cart contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParcelSpec { pub height: u32, pub length: u32, pub weight: u32, pub width: u32 }

impl Default for ParcelSpec {
    fn default() -> Self { Self { height: 15, length: 15, weight: 200, width: 15 } }
}

#[derive(Clone, Debug, Validate)]
pub struct CarrierConfig {
    #[validate(url)]
    pub base_url: String,
    #[validate(length(min = 1))]
    pub token: String,
    pub shop_id: Option<String>,
    #[validate(range(min = 1))]
    pub service_type_id: u32,
    pub origin: ShopOrigin,
    pub parcel: ParcelSpec,
}

impl CarrierConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://dev-online-gateway.ghn.vn/shiip/public-api";

    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            token: token.into(),
            shop_id: None,
            service_type_id: 2,
            origin: ShopOrigin::default(),
            parcel: ParcelSpec::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderConfig {
    pub pays_id: i64,
    pub initial_status: i64,
    pub clear_policy: ClearPolicy,
}

impl Default for OrderConfig {
    fn default() -> Self { Self { pays_id: 2, initial_status: 5, clear_policy: ClearPolicy::default() } }
}

#[derive(Clone, Debug, Validate)]
pub struct StorefrontConfig {
    #[validate(url)]
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub request_timeout: Duration,
    #[validate]
    pub carrier: CarrierConfig,
    pub order: OrderConfig,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl StorefrontConfig {
    pub fn new(api_base_url: impl Into<String>, carrier: CarrierConfig) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            api_token: None,
            request_timeout: Duration::from_millis(30_000),
            carrier,
            order: OrderConfig::default(),
        }
    }

    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = get("CARRIER_TOKEN").ok_or(ConfigError::Missing("CARRIER_TOKEN"))?;
        let defaults = ShopOrigin::default();
        let carrier = CarrierConfig {
            base_url: get("CARRIER_BASE_URL").unwrap_or_else(|| CarrierConfig::DEFAULT_BASE_URL.to_string()),
            token,
            shop_id: get("CARRIER_SHOP_ID"),
            service_type_id: parse_or(get("CARRIER_SERVICE_TYPE_ID"), "CARRIER_SERVICE_TYPE_ID", 2)?,
            origin: ShopOrigin {
                province_id: parse_or(get("SHOP_PROVINCE_ID"), "SHOP_PROVINCE_ID", defaults.province_id)?,
                district_id: parse_or(get("SHOP_DISTRICT_ID"), "SHOP_DISTRICT_ID", defaults.district_id)?,
                ward_code: get("SHOP_WARD_CODE").unwrap_or(defaults.ward_code),
            },
            parcel: ParcelSpec::default(),
        };

        let order_defaults = OrderConfig::default();
        let config = Self {
            api_base_url: get("API_BASE_URL").unwrap_or_else(|| "http://localhost:8000".to_string()),
            api_token: get("API_TOKEN"),
            request_timeout: Duration::from_millis(parse_or(get("REQUEST_TIMEOUT_MS"), "REQUEST_TIMEOUT_MS", 30_000)?),
            carrier,
            order: OrderConfig {
                pays_id: parse_or(get("ORDER_PAYS_ID"), "ORDER_PAYS_ID", order_defaults.pays_id)?,
                initial_status: parse_or(get("ORDER_INITIAL_STATUS"), "ORDER_INITIAL_STATUS", order_defaults.initial_status)?,
                clear_policy: parse_or(get("ORDER_CLEAR_POLICY"), "ORDER_CLEAR_POLICY", order_defaults.clear_policy)?,
            },
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_or<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|e: T::Err| ConfigError::Invalid { key, reason: e.to_string() }),
    }
}
