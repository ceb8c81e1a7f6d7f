//! Customer Aggregate

use serde::{Deserialize, Serialize};

/// Signed-in storefront customer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    #[serde(rename = "cus_name", alias = "name")]
    pub name: String,
    #[serde(rename = "cus_sdt", default)]
    pub phone: Option<String>,
    #[serde(flatten)]
    pub address: Address,
    #[serde(rename = "diem", default)]
    points: u64,
}

impl Customer {
    pub fn new(id: i64, name: impl Into<String>, address: Address, points: u64) -> Self {
        Self { id, name: name.into(), phone: None, address, points }
    }

    pub fn points(&self) -> u64 { self.points }

    /// Balance is only ever taken from a confirmed redemption response.
    pub(crate) fn adopt_points(&mut self, balance: u64) { self.points = balance; }
}

/// Stored delivery address: carrier region codes plus street text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "cus_address", default)]
    pub street: String,
    #[serde(default, deserialize_with = "lenient_id")]
    pub province_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub district_id: Option<i64>,
    #[serde(default)]
    pub ward_code: Option<String>,
}

impl Address {
    /// All codes the carrier needs to quote a delivery.
    pub fn is_deliverable(&self) -> bool {
        self.district_id.is_some() && self.ward_code.as_deref().is_some_and(|w| !w.trim().is_empty())
    }
}

/// Region ids arrive as numbers or numeric strings; blanks mean unset.
fn lenient_id<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw { Num(i64), Text(String) }
    match Option::<Raw>::deserialize(d)? {
        None => Ok(None),
        Some(Raw::Num(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}
