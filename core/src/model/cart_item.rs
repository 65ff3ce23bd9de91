// basket/src/model/cart_item.rs

use super::product::ProductSnapshot;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of a user's cart. At most one per `(user, product_id)`; `quantity >= 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
  pub id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub product: ProductSnapshot,
}

impl CartItem {
  pub fn line_total_cents(&self) -> i64 {
    i64::from(self.quantity) * self.product.price_cents
  }
}

/// Σ quantity over `items`.
pub fn total_items(items: &[CartItem]) -> i64 {
  items.iter().map(|i| i64::from(i.quantity)).sum()
}

/// Σ quantity × snapshot price over `items`.
pub fn total_price_cents(items: &[CartItem]) -> i64 {
  items.iter().map(CartItem::line_total_cents).sum()
}
