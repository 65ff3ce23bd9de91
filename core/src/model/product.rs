// basket/src/model/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog row. Read-only from the cart's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub price_cents: i64,
  pub image_url: Option<String>,
  pub category: Option<String>,
  pub stock: i32,
  pub created_at: DateTime<Utc>,
}

impl Product {
  pub fn snapshot(&self) -> ProductSnapshot {
    ProductSnapshot {
      id: self.id,
      name: self.name.clone(),
      price_cents: self.price_cents,
      image_url: self.image_url.clone(),
    }
  }
}

/// The product columns joined onto a cart row when it is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
  pub id: Uuid,
  pub name: String,
  pub price_cents: i64,
  pub image_url: Option<String>,
}
