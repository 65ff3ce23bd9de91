// tests/common/mod.rs
#![allow(dead_code)]

use basket::{
  CartStore, Compensation, ContextData, Handler, InMemoryGateway, PipelineControl, PipelineError, Product,
};
use chrono::Utc;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

// --- Tracing ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Catalog fixtures ---
pub fn product(name: &str, price_cents: i64) -> Product {
  Product {
    id: Uuid::new_v4(),
    name: name.to_string(),
    description: None,
    price_cents,
    image_url: Some(format!("https://img.example/{}.jpg", name.to_lowercase())),
    category: Some("kurta".to_string()),
    stock: 10,
    created_at: Utc::now(),
  }
}

pub struct Fixture {
  pub gateway: Arc<InMemoryGateway>,
  pub cart: Arc<CartStore>,
  pub user_id: Uuid,
  /// Price 500.
  pub product_a: Product,
  /// Price 300.
  pub product_b: Product,
}

/// A gateway with products A (500) and B (300) and a cart loaded for a fresh user.
pub async fn signed_in_fixture() -> Fixture {
  let product_a = product("A", 500);
  let product_b = product("B", 300);
  let gateway = Arc::new(InMemoryGateway::with_products([product_a.clone(), product_b.clone()]));
  let cart = Arc::new(CartStore::new(gateway.clone()));
  let user_id = Uuid::new_v4();
  cart.load(Some(user_id)).await;
  Fixture {
    gateway,
    cart,
    user_id,
    product_a,
    product_b,
  }
}

// --- Step engine fixtures ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub steps_executed: Vec<String>,
  pub compensated: Vec<String>,
  pub should_stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Engine error: {0}")]
  Engine(String),

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<PipelineError> for TestError {
  fn from(pe: PipelineError) -> Self {
    TestError::Engine(format!("{:?}", pe))
  }
}

pub fn recording_handler(step_name: &'static str) -> Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.steps_executed.push(step_name.to_string());
      if guard.should_stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn failing_handler(step_name: &'static str, message: &'static str) -> Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(TestError::Handler(message.to_string()))
    })
  })
}

pub fn recording_compensation(step_name: &'static str) -> Compensation<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().compensated.push(step_name.to_string());
      Ok(())
    })
  })
}
