// basket/examples/checkout_flow.rs

use basket::{CartStore, CheckoutCoordinator, CheckoutOutcome, InMemoryGateway, OrderHistoryReader, Product, RemoteOp};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

fn product(name: &str, price_cents: i64) -> Product {
  Product {
    id: Uuid::new_v4(),
    name: name.to_string(),
    description: None,
    price_cents,
    image_url: None,
    category: None,
    stock: 10,
    created_at: Utc::now(),
  }
}

#[tokio::main]
async fn main() -> Result<(), basket::BasketError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Cart and checkout walkthrough ---");

  let kurta = product("Kurta", 500);
  let dupatta = product("Dupatta", 300);
  let gateway = Arc::new(InMemoryGateway::with_products([kurta.clone(), dupatta.clone()]));
  let user_id = Uuid::new_v4();

  let cart = Arc::new(CartStore::new(gateway.clone()));
  cart.load(Some(user_id)).await;

  cart.add(kurta.id).await?;
  cart.add(kurta.id).await?;
  cart.add(dupatta.id).await?;
  info!(
    total_items = cart.total_items(),
    total_price_cents = cart.total_price_cents(),
    "Cart filled."
  );

  let coordinator = CheckoutCoordinator::new(cart.clone());

  // First attempt: the order-items write fails and the order row is rolled back.
  gateway.fail_next(RemoteOp::InsertOrderItems);
  if let Err(e) = coordinator.checkout().await {
    info!(error = %e, orders = gateway.stored_orders().len(), "Checkout failed and was rolled back.");
  }

  match coordinator.checkout().await? {
    CheckoutOutcome::Placed(placed) => info!(
      order_id = %placed.order.id,
      total_amount_cents = placed.order.total_amount_cents,
      lines = placed.items.len(),
      "Order placed."
    ),
    CheckoutOutcome::EmptyCart => info!("Nothing to check out."),
  }

  for summary in OrderHistoryReader::new(gateway).orders(Some(user_id)).await {
    info!(order_id = %summary.order.id, lines = summary.lines.len(), "History entry.");
  }
  Ok(())
}
