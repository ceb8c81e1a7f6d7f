//! Cart and checkout pricing.
//!
//! Only selected lines count. Item discounts apply per line; a cart-level
//! discount, when set, applies to the discounted sum. Amounts stay exact
//! until [`CheckoutTotals::rounded`].

use crate::domain::aggregates::{Cart, Voucher};
use crate::domain::value_objects::Money;

#[derive(Debug, Clone, Copy, Default)]
pub struct PricingEngine;

/// Breakdown shown on the payment screen and used for the order payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CheckoutTotals {
    /// Σ unit price × quantity, before any discount.
    pub list_price: Money,
    pub item_discount: Money,
    pub cart_discount: Money,
    /// What the selected goods cost after item and cart discounts.
    pub merchandise: Money,
    pub voucher_discount: Money,
    pub shipping_fee: Money,
    pub grand_total: Money,
}

impl CheckoutTotals {
    pub fn rounded(&self) -> CheckoutTotals {
        CheckoutTotals {
            list_price: self.list_price.rounded(),
            item_discount: self.item_discount.rounded(),
            cart_discount: self.cart_discount.rounded(),
            merchandise: self.merchandise.rounded(),
            voucher_discount: self.voucher_discount.rounded(),
            shipping_fee: self.shipping_fee.rounded(),
            grand_total: self.grand_total.rounded(),
        }
    }
}

impl PricingEngine {
    /// Σ over selected lines of discounted unit price × quantity, with the
    /// cart-level discount applied afterwards.
    pub fn calculate_total(cart: &Cart) -> Money {
        let items: Money = cart.selected_items().map(|i| i.line_total()).sum();
        match cart.discount() { Some(d) => items.less_percent(d), None => items }
    }

    /// Σ unit price × quantity over selected lines, before any discount. Declared to the carrier as the parcel value.
    pub fn declared_value(cart: &Cart) -> Money {
        cart.selected_items().map(|i| i.unit_price.multiply(i.quantity)).sum()
    }

    pub fn checkout_totals(cart: &Cart, voucher: Option<&Voucher>, shipping_fee: Money) -> CheckoutTotals {
        let list_price = Self::declared_value(cart);
        let discounted: Money = cart.selected_items().map(|i| i.line_total()).sum();
        let merchandise = Self::calculate_total(cart);
        let voucher_discount = voucher.map(|v| v.discount_for(merchandise)).unwrap_or(Money::ZERO);
        CheckoutTotals {
            list_price,
            item_discount: list_price - discounted,
            cart_discount: discounted - merchandise,
            merchandise,
            voucher_discount,
            shipping_fee,
            grand_total: merchandise.saturating_sub(voucher_discount) + shipping_fee,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{CartItem, VoucherValue};
    use crate::domain::value_objects::{Percent, ProductId};

    fn item(id: i64, price: i64, discount: u32) -> CartItem {
        CartItem::new(ProductId(id), format!("P{id}"), Money::from_units(price)).with_discount(Percent::whole(discount).unwrap())
    }

    fn sample_cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_item(item(1, 100_000, 10), 2);
        cart.add_item(item(2, 50_000, 0), 1);
        cart
    }

    #[test]
    fn test_total_applies_item_discounts() {
        assert_eq!(PricingEngine::calculate_total(&sample_cart()), Money::from_units(230_000));
    }

    #[test]
    fn test_empty_selection_totals_zero() {
        let mut cart = sample_cart();
        cart.deselect_all();
        assert_eq!(PricingEngine::calculate_total(&cart), Money::ZERO);
        assert_eq!(PricingEngine::calculate_total(&Cart::new()), Money::ZERO);
    }

    #[test]
    fn test_unselected_lines_are_excluded() {
        let mut cart = sample_cart();
        cart.toggle_selection(ProductId(1));
        assert_eq!(PricingEngine::calculate_total(&cart), Money::from_units(50_000));
    }

    #[test]
    fn test_cart_discount_applies_after_item_discounts() {
        let mut cart = sample_cart();
        cart.set_discount(Some(Percent::whole(10).unwrap()));
        assert_eq!(PricingEngine::calculate_total(&cart), Money::from_units(207_000));
    }

    #[test]
    fn test_declared_value_ignores_discounts() {
        let mut cart = sample_cart();
        cart.set_discount(Some(Percent::whole(10).unwrap()));
        assert_eq!(PricingEngine::declared_value(&cart), Money::from_units(250_000));
        cart.toggle_selection(ProductId(2));
        assert_eq!(PricingEngine::declared_value(&cart), Money::from_units(200_000));
    }

    #[test]
    fn test_checkout_breakdown() {
        let voucher = Voucher {
            code: "XTRA5".into(), name: "5%".into(), value: VoucherValue::Percent(Percent::whole(5).unwrap()),
            min_spend: Money::from_units(100_000), max_discount: Some(Money::from_units(20_000)), expires_on: None,
        };
        let totals = PricingEngine::checkout_totals(&sample_cart(), Some(&voucher), Money::from_units(22_000));
        assert_eq!(totals.list_price, Money::from_units(250_000));
        assert_eq!(totals.item_discount, Money::from_units(20_000));
        assert_eq!(totals.cart_discount, Money::ZERO);
        assert_eq!(totals.voucher_discount, Money::from_units(11_500));
        assert_eq!(totals.grand_total, Money::from_units(240_500));
    }

    #[test]
    fn test_rounding_happens_at_the_boundary() {
        let mut cart = Cart::new();
        cart.add_item(item(1, 33_333, 15), 3);
        let totals = PricingEngine::checkout_totals(&cart, None, Money::ZERO);
        assert_ne!(totals.merchandise, totals.merchandise.rounded());
        assert_eq!(totals.rounded().merchandise, Money::from_units(84_999));
    }
}
