// basket/src/gateway/memory.rs

//! A process-local `RemoteCartGateway`. It enforces the same constraints the Postgres
//! schema does (unique cart line per product, foreign keys) and can be told to fail
//! specific calls, which is how the failure paths of the cart and checkout are tested.

use super::{RemoteCartGateway, RemoteOp};
use crate::error::GatewayError;
use crate::model::{CartItem, NewOrder, NewOrderItem, Order, OrderItem, OrderLine, Product};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use tracing::{event, Level};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct CartRow {
  id: Uuid,
  user_id: Uuid,
  product_id: Uuid,
  quantity: i32,
}

#[derive(Debug, Default)]
struct Tables {
  products: HashMap<Uuid, Product>,
  cart_items: Vec<CartRow>,
  orders: Vec<Order>,
  order_items: Vec<OrderItem>,
}

impl Tables {
  fn join_cart_row(&self, row: &CartRow) -> Option<CartItem> {
    self.products.get(&row.product_id).map(|product| CartItem {
      id: row.id,
      product_id: row.product_id,
      quantity: row.quantity,
      product: product.snapshot(),
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureMode {
  Once,
  Always,
}

#[derive(Debug, Default)]
pub struct InMemoryGateway {
  tables: RwLock<Tables>,
  failures: Mutex<HashMap<RemoteOp, FailureMode>>,
  calls: Mutex<Vec<RemoteOp>>,
}

impl InMemoryGateway {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
    let gateway = Self::new();
    for product in products {
      gateway.add_product(product);
    }
    gateway
  }

  pub fn add_product(&self, product: Product) {
    self.tables.write().products.insert(product.id, product);
  }

  /// Changes a catalog price, as an admin edit would. Existing orders must not follow it.
  pub fn set_price(&self, product_id: Uuid, price_cents: i64) {
    if let Some(product) = self.tables.write().products.get_mut(&product_id) {
      product.price_cents = price_cents;
    }
  }

  pub fn products(&self) -> Vec<Product> {
    let mut products: Vec<Product> = self.tables.read().products.values().cloned().collect();
    products.sort_by(|a, b| a.name.cmp(&b.name));
    products
  }

  /// The next call of `op` fails with `Unavailable`.
  pub fn fail_next(&self, op: RemoteOp) {
    self.failures.lock().insert(op, FailureMode::Once);
  }

  /// Every call of `op` fails with `Unavailable` until `heal(op)`.
  pub fn fail_always(&self, op: RemoteOp) {
    self.failures.lock().insert(op, FailureMode::Always);
  }

  pub fn heal(&self, op: RemoteOp) {
    self.failures.lock().remove(&op);
  }

  /// Every call issued so far, in order.
  pub fn calls(&self) -> Vec<RemoteOp> {
    self.calls.lock().clone()
  }

  pub fn call_count(&self, op: RemoteOp) -> usize {
    self.calls.lock().iter().filter(|c| **c == op).count()
  }

  /// Raw cart rows of `user_id` as `(item_id, product_id, quantity)`, bypassing failure
  /// injection.
  pub fn stored_cart(&self, user_id: Uuid) -> Vec<(Uuid, Uuid, i32)> {
    self
      .tables
      .read()
      .cart_items
      .iter()
      .filter(|r| r.user_id == user_id)
      .map(|r| (r.id, r.product_id, r.quantity))
      .collect()
  }

  pub fn stored_orders(&self) -> Vec<Order> {
    self.tables.read().orders.clone()
  }

  pub fn stored_order_items(&self) -> Vec<OrderItem> {
    self.tables.read().order_items.clone()
  }

  /// Writes a cart row directly, as another device of the same user would.
  pub fn seed_cart_row(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Uuid {
    let id = Uuid::new_v4();
    self.tables.write().cart_items.push(CartRow {
      id,
      user_id,
      product_id,
      quantity,
    });
    id
  }

  fn enter(&self, op: RemoteOp) -> Result<(), GatewayError> {
    self.calls.lock().push(op);
    let mut failures = self.failures.lock();
    match failures.get(&op).copied() {
      Some(FailureMode::Once) => {
        failures.remove(&op);
      }
      Some(FailureMode::Always) => {}
      None => return Ok(()),
    }
    event!(Level::DEBUG, %op, "Injected remote failure.");
    Err(GatewayError::Unavailable(format!("injected failure: {}", op)))
  }
}

#[async_trait]
impl RemoteCartGateway for InMemoryGateway {
  async fn fetch_cart(&self, user_id: Uuid) -> Result<Vec<CartItem>, GatewayError> {
    self.enter(RemoteOp::FetchCart)?;
    let tables = self.tables.read();
    Ok(
      tables
        .cart_items
        .iter()
        .filter(|r| r.user_id == user_id)
        .filter_map(|r| tables.join_cart_row(r))
        .collect(),
    )
  }

  async fn insert_cart_item(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem, GatewayError> {
    self.enter(RemoteOp::InsertCartItem)?;
    let mut tables = self.tables.write();
    if !tables.products.contains_key(&product_id) {
      return Err(GatewayError::Rejected {
        collection: "cart_items",
        message: format!("product {} does not exist", product_id),
      });
    }
    if tables
      .cart_items
      .iter()
      .any(|r| r.user_id == user_id && r.product_id == product_id)
    {
      return Err(GatewayError::Rejected {
        collection: "cart_items",
        message: format!("duplicate cart line for product {}", product_id),
      });
    }
    let row = CartRow {
      id: Uuid::new_v4(),
      user_id,
      product_id,
      quantity,
    };
    tables.cart_items.push(row.clone());
    tables
      .join_cart_row(&row)
      .ok_or_else(|| GatewayError::Unavailable("inserted row vanished".to_string()))
  }

  async fn update_cart_item_quantity(&self, user_id: Uuid, item_id: Uuid, quantity: i32) -> Result<bool, GatewayError> {
    self.enter(RemoteOp::UpdateCartItem)?;
    let mut tables = self.tables.write();
    match tables
      .cart_items
      .iter_mut()
      .find(|r| r.id == item_id && r.user_id == user_id)
    {
      Some(row) => {
        row.quantity = quantity;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn delete_cart_item(&self, user_id: Uuid, item_id: Uuid) -> Result<bool, GatewayError> {
    self.enter(RemoteOp::DeleteCartItem)?;
    let mut tables = self.tables.write();
    let before = tables.cart_items.len();
    tables
      .cart_items
      .retain(|r| !(r.id == item_id && r.user_id == user_id));
    Ok(tables.cart_items.len() != before)
  }

  async fn delete_cart_items(&self, user_id: Uuid) -> Result<(), GatewayError> {
    self.enter(RemoteOp::ClearCart)?;
    self.tables.write().cart_items.retain(|r| r.user_id != user_id);
    Ok(())
  }

  async fn insert_order(&self, order: NewOrder) -> Result<Order, GatewayError> {
    self.enter(RemoteOp::InsertOrder)?;
    let stored = Order {
      id: Uuid::new_v4(),
      user_id: order.user_id,
      total_amount_cents: order.total_amount_cents,
      status: order.status,
      created_at: Utc::now(),
    };
    self.tables.write().orders.push(stored.clone());
    Ok(stored)
  }

  async fn insert_order_items(&self, items: Vec<NewOrderItem>) -> Result<Vec<OrderItem>, GatewayError> {
    self.enter(RemoteOp::InsertOrderItems)?;
    let mut tables = self.tables.write();
    for item in &items {
      if !tables.orders.iter().any(|o| o.id == item.order_id) {
        return Err(GatewayError::Rejected {
          collection: "order_items",
          message: format!("order {} does not exist", item.order_id),
        });
      }
    }
    let stored: Vec<OrderItem> = items
      .into_iter()
      .map(|item| OrderItem {
        id: Uuid::new_v4(),
        order_id: item.order_id,
        product_id: item.product_id,
        quantity: item.quantity,
        price_at_purchase_cents: item.price_at_purchase_cents,
      })
      .collect();
    tables.order_items.extend(stored.iter().cloned());
    Ok(stored)
  }

  async fn delete_order_items(&self, order_id: Uuid) -> Result<(), GatewayError> {
    self.enter(RemoteOp::DeleteOrderItems)?;
    self.tables.write().order_items.retain(|i| i.order_id != order_id);
    Ok(())
  }

  async fn delete_order(&self, order_id: Uuid) -> Result<(), GatewayError> {
    self.enter(RemoteOp::DeleteOrder)?;
    let mut tables = self.tables.write();
    tables.orders.retain(|o| o.id != order_id);
    tables.order_items.retain(|i| i.order_id != order_id);
    Ok(())
  }

  async fn list_orders(&self, user_id: Uuid) -> Result<Vec<Order>, GatewayError> {
    self.enter(RemoteOp::ListOrders)?;
    let mut orders: Vec<Order> = self
      .tables
      .read()
      .orders
      .iter()
      .rev()
      .filter(|o| o.user_id == user_id)
      .cloned()
      .collect();
    // Stable sort keeps reverse insertion order for equal timestamps.
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
  }

  async fn list_order_lines(&self, order_id: Uuid) -> Result<Vec<OrderLine>, GatewayError> {
    self.enter(RemoteOp::ListOrderLines)?;
    let tables = self.tables.read();
    Ok(
      tables
        .order_items
        .iter()
        .filter(|i| i.order_id == order_id)
        .filter_map(|i| {
          tables.products.get(&i.product_id).map(|p| OrderLine {
            id: i.id,
            product_id: i.product_id,
            quantity: i.quantity,
            price_at_purchase_cents: i.price_at_purchase_cents,
            product_name: p.name.clone(),
            image_url: p.image_url.clone(),
          })
        })
        .collect(),
    )
  }
}
