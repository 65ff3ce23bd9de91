// basket/src/model/order_item.rs

use super::order::Order;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A purchased line. `price_at_purchase_cents` is frozen at checkout and does not follow
/// later catalog price changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub price_at_purchase_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub price_at_purchase_cents: i64,
}

/// An order item joined with the product's display columns, as order history reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
  pub id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub price_at_purchase_cents: i64,
  pub product_name: String,
  pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
  pub order: Order,
  pub lines: Vec<OrderLine>,
}
