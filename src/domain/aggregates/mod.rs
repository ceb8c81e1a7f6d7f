//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;
pub mod customer;
pub mod voucher;

pub use product::{CatalogProduct, PromotionBundle, SaleOff};
pub use order::{CreateOrderRequest, OrderCustomer, OrderLine, OrderPayment, OrderReceipt, PaymentMethod, PlacedOrder};
pub use cart::{Cart, CartAction, CartItem};
pub use customer::{Address, Customer};
pub use voucher::{Voucher, VoucherDefinition, VoucherError, VoucherValue};
