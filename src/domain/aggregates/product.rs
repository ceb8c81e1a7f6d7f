//! Catalog product shapes and their mapping into cart lines

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::cart::CartItem;
use crate::domain::value_objects::{Money, Percent, ProductId};

/// A product as served by the catalog and product-detail endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    #[serde(alias = "p_name", alias = "name")]
    pub product_name: String,
    #[serde(alias = "p_selling")]
    pub selling_price: Decimal,
    #[serde(default)]
    pub sale_off: Vec<SaleOff>,
}

/// Percentage sale attached to a product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaleOff {
    pub s_percent: Decimal,
    #[serde(default)]
    pub s_name: Option<String>,
    #[serde(default)]
    pub s_start: Option<String>,
    #[serde(default)]
    pub s_end: Option<String>,
}

impl CatalogProduct {
    /// The first listed sale is the one in effect; out-of-range percents are ignored.
    pub fn active_discount(&self) -> Option<Percent> {
        self.sale_off.first().and_then(|s| Percent::new(s.s_percent).ok()).filter(|p| !p.is_zero())
    }
}

impl From<&CatalogProduct> for CartItem {
    fn from(p: &CatalogProduct) -> Self {
        let item = CartItem::new(p.id, p.product_name.clone(), Money::new(p.selling_price));
        match p.active_discount() { Some(d) => item.with_discount(d), None => item }
    }
}

/// Promotion listing entry: a discounted product, optionally bundled with a free gift.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromotionBundle {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    pub discount_percentage: Decimal,
    pub product: CatalogProduct,
    #[serde(default)]
    pub gift: Option<CatalogProduct>,
}

impl PromotionBundle {
    /// Cart lines this promotion contributes: the product at the promotion
    /// percent, and the gift line when there is one.
    pub fn into_lines(&self) -> (CartItem, Option<CartItem>) {
        let mut item = CartItem::from(&self.product);
        if let Ok(p) = Percent::new(self.discount_percentage) { item = item.with_discount(p); }
        let gift = self.gift.as_ref().map(|g| CartItem::gift(g.id, g.product_name.clone(), self.product.id));
        (item, gift)
    }
}
