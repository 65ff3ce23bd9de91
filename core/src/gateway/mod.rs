// basket/src/gateway/mod.rs

//! Row-level access to the remote store. No multi-row transactions are assumed; anything
//! that must succeed as a unit is built on top of these calls (see `checkout`).

pub mod memory;

use crate::error::GatewayError;
use crate::model::{CartItem, NewOrder, NewOrderItem, Order, OrderItem, OrderLine};
use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

pub use memory::InMemoryGateway;

/// Names each remote call, for error messages, logs and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
  FetchCart,
  InsertCartItem,
  UpdateCartItem,
  DeleteCartItem,
  ClearCart,
  InsertOrder,
  InsertOrderItems,
  DeleteOrderItems,
  DeleteOrder,
  ListOrders,
  ListOrderLines,
}

impl fmt::Display for RemoteOp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      RemoteOp::FetchCart => "fetch the cart",
      RemoteOp::InsertCartItem => "add the item to the cart",
      RemoteOp::UpdateCartItem => "update the cart item",
      RemoteOp::DeleteCartItem => "remove the cart item",
      RemoteOp::ClearCart => "clear the cart",
      RemoteOp::InsertOrder => "create the order",
      RemoteOp::InsertOrderItems => "record the order items",
      RemoteOp::DeleteOrderItems => "delete the order items",
      RemoteOp::DeleteOrder => "delete the order",
      RemoteOp::ListOrders => "list orders",
      RemoteOp::ListOrderLines => "list order items",
    };
    f.write_str(text)
  }
}

/// The persistent store as the cart and checkout see it.
///
/// Implementations scope every cart row operation by `user_id`: a row owned by another
/// user behaves as if it did not exist.
#[async_trait]
pub trait RemoteCartGateway: Send + Sync {
  /// All cart rows of `user_id`, each joined with its product snapshot.
  async fn fetch_cart(&self, user_id: Uuid) -> Result<Vec<CartItem>, GatewayError>;

  /// Inserts one cart row and returns it joined with its product snapshot.
  /// Fails with `Rejected` if `(user_id, product_id)` already has a row.
  async fn insert_cart_item(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem, GatewayError>;

  /// Returns `false` if no such row exists for this user.
  async fn update_cart_item_quantity(&self, user_id: Uuid, item_id: Uuid, quantity: i32) -> Result<bool, GatewayError>;

  /// Returns `false` if no such row existed for this user.
  async fn delete_cart_item(&self, user_id: Uuid, item_id: Uuid) -> Result<bool, GatewayError>;

  /// Deletes every cart row owned by `user_id`.
  async fn delete_cart_items(&self, user_id: Uuid) -> Result<(), GatewayError>;

  async fn insert_order(&self, order: NewOrder) -> Result<Order, GatewayError>;

  /// Bulk insert. All rows must reference the same existing order.
  async fn insert_order_items(&self, items: Vec<NewOrderItem>) -> Result<Vec<OrderItem>, GatewayError>;

  async fn delete_order_items(&self, order_id: Uuid) -> Result<(), GatewayError>;

  async fn delete_order(&self, order_id: Uuid) -> Result<(), GatewayError>;

  /// Orders of `user_id`, newest first.
  async fn list_orders(&self, user_id: Uuid) -> Result<Vec<Order>, GatewayError>;

  async fn list_order_lines(&self, order_id: Uuid) -> Result<Vec<OrderLine>, GatewayError>;
}
