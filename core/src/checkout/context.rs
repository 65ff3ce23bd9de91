// basket/src/checkout/context.rs

//! Data threaded through the checkout pipeline, wrapped in `ContextData`.

use crate::cart::CartStore;
use crate::gateway::RemoteCartGateway;
use crate::model::{CartItem, Order, OrderItem};
use std::sync::Arc;
use uuid::Uuid;

pub struct CheckoutCtxData {
  pub cart: Arc<CartStore>,
  pub gateway: Arc<dyn RemoteCartGateway>,
  pub user_id: Uuid,
  /// Cart lines as they were when checkout started. Never re-read mid-run.
  pub items: Vec<CartItem>,
  pub total_amount_cents: i64,
  pub order: Option<Order>,
  pub order_items: Vec<OrderItem>,
  pub order_rolled_back: bool,
}

impl CheckoutCtxData {
  pub fn new(cart: Arc<CartStore>, user_id: Uuid) -> Self {
    let gateway = cart.gateway();
    Self {
      cart,
      gateway,
      user_id,
      items: Vec::new(),
      total_amount_cents: 0,
      order: None,
      order_items: Vec::new(),
      order_rolled_back: false,
    }
  }

  pub fn order_id(&self) -> Option<Uuid> {
    self.order.as_ref().map(|o| o.id)
  }
}
