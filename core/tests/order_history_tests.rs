// tests/order_history_tests.rs
mod common;

use basket::{BasketError, CheckoutCoordinator, OrderHistoryReader, RemoteOp};
use common::*;
use serial_test::serial;
use uuid::Uuid;

#[tokio::test]
#[serial]
async fn test_history_lists_placed_orders_newest_first() {
  setup_tracing();
  let f = signed_in_fixture().await;
  let coordinator = CheckoutCoordinator::new(f.cart.clone());

  f.cart.add(f.product_a.id).await.unwrap();
  coordinator.checkout().await.unwrap();
  tokio::time::sleep(std::time::Duration::from_millis(5)).await;
  f.cart.add(f.product_b.id).await.unwrap();
  f.cart.add(f.product_b.id).await.unwrap();
  coordinator.checkout().await.unwrap();

  let history = OrderHistoryReader::new(f.gateway.clone()).orders(Some(f.user_id)).await;

  assert_eq!(history.len(), 2);
  assert_eq!(history[0].order.total_amount_cents, 600);
  assert_eq!(history[1].order.total_amount_cents, 500);
  let newest_line = &history[0].lines[0];
  assert_eq!(newest_line.product_name, "B");
  assert_eq!(newest_line.quantity, 2);
  assert_eq!(newest_line.price_at_purchase_cents, 300);
  assert_eq!(newest_line.image_url, f.product_b.image_url);
}

#[tokio::test]
#[serial]
async fn test_history_is_empty_without_user_or_on_failure() {
  setup_tracing();
  let f = signed_in_fixture().await;
  f.cart.add(f.product_a.id).await.unwrap();
  CheckoutCoordinator::new(f.cart.clone()).checkout().await.unwrap();
  let reader = OrderHistoryReader::new(f.gateway.clone());

  assert!(reader.orders(None).await.is_empty());
  assert!(reader.orders(Some(Uuid::new_v4())).await.is_empty());

  f.gateway.fail_next(RemoteOp::ListOrders);
  assert!(reader.orders(Some(f.user_id)).await.is_empty());

  f.gateway.fail_next(RemoteOp::ListOrders);
  assert!(matches!(
    reader.try_orders(f.user_id).await,
    Err(BasketError::RemoteRead {
      op: RemoteOp::ListOrders,
      ..
    })
  ));
}

#[tokio::test]
#[serial]
async fn test_failed_line_listing_keeps_order() {
  setup_tracing();
  let f = signed_in_fixture().await;
  f.cart.add(f.product_a.id).await.unwrap();
  CheckoutCoordinator::new(f.cart.clone()).checkout().await.unwrap();
  f.gateway.fail_next(RemoteOp::ListOrderLines);

  let history = OrderHistoryReader::new(f.gateway.clone()).try_orders(f.user_id).await.unwrap();

  assert_eq!(history.len(), 1);
  assert!(history[0].lines.is_empty());
}
