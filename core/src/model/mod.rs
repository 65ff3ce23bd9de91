// basket/src/model/mod.rs

//! Entities shared by the cart, checkout and the remote store.

pub mod cart_item;
pub mod order;
pub mod order_item;
pub mod product;

pub use cart_item::{total_items, total_price_cents, CartItem};
pub use order::{NewOrder, Order, OrderStatus};
pub use order_item::{NewOrderItem, OrderItem, OrderLine, OrderSummary};
pub use product::{Product, ProductSnapshot};
