// apps/basket_server/src/seed.rs

//! Demo catalog for running the server without a database.

use basket::Product;
use chrono::Utc;
use uuid::Uuid;

pub fn demo_catalog() -> Vec<Product> {
  [
    ("Indigo Cotton Kurta", 149_900, "kurta"),
    ("Block Print Kurta", 189_900, "kurta"),
    ("Linen Nehru Jacket", 249_900, "jacket"),
    ("Chikankari Dupatta", 99_900, "dupatta"),
    ("Silk Blend Churidar", 79_900, "bottoms"),
  ]
  .into_iter()
  .map(|(name, price_cents, category)| Product {
    id: Uuid::new_v4(),
    name: name.to_string(),
    description: None,
    price_cents,
    image_url: None,
    category: Some(category.to_string()),
    stock: 25,
    created_at: Utc::now(),
  })
  .collect()
}
