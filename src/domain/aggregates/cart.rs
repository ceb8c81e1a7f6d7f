//! Cart Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use crate::domain::value_objects::{Money, Percent, ProductId};

/// One line of the cart, keyed by product id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub discount: Option<Percent>,
    /// Byproduct of a bundled promotion; not adjustable through `update_quantity`.
    pub is_gift: bool,
    /// Product line whose promotion brought this gift in.
    #[serde(default)]
    pub gift_of: Option<ProductId>,
}

impl CartItem {
    pub fn new(id: ProductId, name: impl Into<String>, unit_price: Money) -> Self {
        Self { id, name: name.into(), unit_price, quantity: 0, discount: None, is_gift: false, gift_of: None }
    }

    pub fn with_discount(mut self, discount: Percent) -> Self {
        self.discount = (!discount.is_zero()).then_some(discount);
        self
    }

    pub fn gift(id: ProductId, name: impl Into<String>, parent: ProductId) -> Self {
        Self { id, name: name.into(), unit_price: Money::ZERO, quantity: 0, discount: None, is_gift: true, gift_of: Some(parent) }
    }

    pub fn discounted_unit_price(&self) -> Money {
        match self.discount { Some(p) => self.unit_price.less_percent(p), None => self.unit_price }
    }

    pub fn line_total(&self) -> Money { self.discounted_unit_price().multiply(self.quantity) }

    /// Absolute amount the item discount takes off this line.
    pub fn discount_amount(&self) -> Money {
        match self.discount { Some(p) => self.unit_price.multiply(self.quantity).percent_of(p), None => Money::ZERO }
    }
}

/// Typed cart mutations, applied through [`Cart::reduce`].
#[derive(Clone, Debug, PartialEq)]
pub enum CartAction {
    Add { item: CartItem, quantity: u32 },
    AddBundle { item: CartItem, gift: CartItem, quantity: u32 },
    UpdateQuantity { id: ProductId, quantity: u32 },
    Remove(ProductId),
    ToggleSelection(ProductId),
    SelectAll,
    DeselectAll,
    SetDiscount(Option<Percent>),
    ApplyItemDiscount { id: ProductId, discount: Option<Percent> },
    Clear,
}

/// Session-scoped cart. Items keep insertion order; `selected` decides what
/// takes part in totals and checkout.
#[derive(Clone, Debug, Default)]
pub struct Cart {
    items: Vec<CartItem>,
    selected: BTreeSet<ProductId>,
    discount: Option<Percent>,
    updated_at: Option<DateTime<Utc>>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn item(&self, id: ProductId) -> Option<&CartItem> { self.items.iter().find(|i| i.id == id) }
    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn discount(&self) -> Option<Percent> { self.discount }
    pub fn selection(&self) -> &BTreeSet<ProductId> { &self.selected }
    pub fn is_selected(&self, id: ProductId) -> bool { self.selected.contains(&id) }
    pub fn updated_at(&self) -> Option<DateTime<Utc>> { self.updated_at }

    pub fn selected_items(&self) -> impl Iterator<Item = &CartItem> + '_ {
        self.items.iter().filter(|i| self.selected.contains(&i.id))
    }

    /// Consume the cart and return it with `action` applied.
    pub fn reduce(mut self, action: CartAction) -> Cart {
        match action {
            CartAction::Add { item, quantity } => { self.add_item(item, quantity); }
            CartAction::AddBundle { item, gift, quantity } => { self.add_bundle(item, gift, quantity); }
            CartAction::UpdateQuantity { id, quantity } => { self.update_quantity(id, quantity); }
            CartAction::Remove(id) => { self.remove_item(id); }
            CartAction::ToggleSelection(id) => { self.toggle_selection(id); }
            CartAction::SelectAll => self.select_all(),
            CartAction::DeselectAll => self.deselect_all(),
            CartAction::SetDiscount(discount) => self.set_discount(discount),
            CartAction::ApplyItemDiscount { id, discount } => { self.apply_item_discount(id, discount); }
            CartAction::Clear => self.clear(),
        }
        self
    }

    /// Merge into an existing line with the same id, or append. New lines start selected.
    ///
    /// A paid line and a gift line never share an id: an add that would mix
    /// them, or attach a gift to a different parent, is refused.
    pub fn add_item(&mut self, mut item: CartItem, quantity: u32) -> bool {
        if quantity == 0 { return false; }
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            if existing.is_gift != item.is_gift || existing.gift_of != item.gift_of { return false; }
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            item.quantity = quantity;
            self.selected.insert(item.id);
            self.items.push(item);
        }
        self.touch();
        true
    }

    /// Add a promoted product and its free gift; the gift follows only if the product went in.
    pub fn add_bundle(&mut self, item: CartItem, mut gift: CartItem, quantity: u32) -> bool {
        gift.is_gift = true;
        gift.gift_of = Some(item.id);
        gift.unit_price = Money::ZERO;
        if !self.add_item(item, quantity) { return false; }
        self.add_item(gift, quantity);
        true
    }

    /// Set a line's quantity exactly. No-op for gifts, zero, or unknown ids.
    pub fn update_quantity(&mut self, id: ProductId, quantity: u32) -> bool {
        if quantity == 0 { return false; }
        let Some(item) = self.items.iter_mut().find(|i| i.id == id && !i.is_gift) else { return false };
        item.quantity = quantity;
        self.touch();
        true
    }

    /// Remove a line, its selection, and any gifts it brought in.
    pub fn remove_item(&mut self, id: ProductId) -> Option<CartItem> {
        let pos = self.items.iter().position(|i| i.id == id)?;
        let removed = self.items.remove(pos);
        self.selected.remove(&id);
        let gifts: Vec<ProductId> = self.items.iter().filter(|i| i.gift_of == Some(id)).map(|i| i.id).collect();
        for gift in gifts { self.remove_item(gift); }
        self.touch();
        Some(removed)
    }

    /// Flip selection of a line; returns whether it is now selected.
    pub fn toggle_selection(&mut self, id: ProductId) -> bool {
        if self.item(id).is_none() { return false; }
        if !self.selected.remove(&id) { self.selected.insert(id); }
        self.touch();
        self.selected.contains(&id)
    }

    pub fn select_all(&mut self) { self.selected = self.items.iter().map(|i| i.id).collect(); self.touch(); }
    pub fn deselect_all(&mut self) { self.selected.clear(); self.touch(); }

    pub fn set_discount(&mut self, discount: Option<Percent>) {
        self.discount = discount.filter(|p| !p.is_zero());
        self.touch();
    }

    pub fn apply_item_discount(&mut self, id: ProductId, discount: Option<Percent>) -> bool {
        let Some(item) = self.items.iter_mut().find(|i| i.id == id) else { return false };
        item.discount = discount.filter(|p| !p.is_zero());
        self.touch();
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.selected.clear();
        self.discount = None;
        self.touch();
    }

    fn touch(&mut self) { self.updated_at = Some(Utc::now()); }
}
