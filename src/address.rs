//! Resolution of stored region codes to display names.

use std::sync::Arc;
use tracing::warn;

use crate::domain::aggregates::Address;
use crate::services::GeographyService;

/// Display names for an address. Empty components are unresolved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub street: String,
    pub ward: String,
    pub district: String,
    pub province: String,
}

impl ResolvedAddress {
    pub fn is_fully_resolved(&self) -> bool {
        !(self.ward.is_empty() || self.district.is_empty() || self.province.is_empty())
    }

    /// `street, ward, district, province`, skipping unresolved parts.
    pub fn display(&self) -> String {
        [&self.street, &self.ward, &self.district, &self.province]
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Clone)]
pub struct AddressResolver {
    geography: Arc<dyn GeographyService>,
}

impl AddressResolver {
    pub fn new(geography: Arc<dyn GeographyService>) -> Self { Self { geography } }

    /// Never fails: a lookup error or a missing match leaves that part empty.
    pub async fn resolve(&self, address: &Address) -> ResolvedAddress {
        let (province, district, ward) = tokio::join!(
            self.province_name(address.province_id),
            self.district_name(address.province_id, address.district_id),
            self.ward_name(address.district_id, address.ward_code.as_deref()),
        );
        ResolvedAddress { street: address.street.clone(), ward, district, province }
    }

    async fn province_name(&self, province_id: Option<i64>) -> String {
        let Some(id) = province_id else { return String::new() };
        match self.geography.provinces().await {
            Ok(list) => list.into_iter().find(|p| p.id == id).map(|p| p.name).unwrap_or_default(),
            Err(err) => { warn!(province_id = id, error = %err, "province lookup failed"); String::new() }
        }
    }

    async fn district_name(&self, province_id: Option<i64>, district_id: Option<i64>) -> String {
        let (Some(province), Some(id)) = (province_id, district_id) else { return String::new() };
        match self.geography.districts(province).await {
            Ok(list) => list.into_iter().find(|d| d.id == id).map(|d| d.name).unwrap_or_default(),
            Err(err) => { warn!(district_id = id, error = %err, "district lookup failed"); String::new() }
        }
    }

    async fn ward_name(&self, district_id: Option<i64>, ward_code: Option<&str>) -> String {
        let (Some(district), Some(code)) = (district_id, ward_code) else { return String::new() };
        match self.geography.wards(district).await {
            Ok(list) => list.into_iter().find(|w| w.code == code).map(|w| w.name).unwrap_or_default(),
            Err(err) => { warn!(ward_code = code, error = %err, "ward lookup failed"); String::new() }
        }
    }
}

impl std::fmt::Debug for AddressResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("AddressResolver").finish_non_exhaustive() }
}
