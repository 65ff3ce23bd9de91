// tests/cart_store_tests.rs
mod common;

use basket::{BasketError, CartStore, GatewayError, InMemoryGateway, RemoteOp, ReplicaStatus};
use common::*;
use serial_test::serial;
use std::sync::Arc;
use uuid::Uuid;

fn assert_totals_consistent(cart: &CartStore) {
  let items = cart.items();
  let expected_items: i64 = items.iter().map(|i| i64::from(i.quantity)).sum();
  let expected_price: i64 = items.iter().map(|i| i64::from(i.quantity) * i.product.price_cents).sum();
  assert_eq!(cart.total_items(), expected_items);
  assert_eq!(cart.total_price_cents(), expected_price);
  assert!(items.iter().all(|i| i.quantity >= 1));
}

#[tokio::test]
#[serial]
async fn test_add_new_product_creates_single_line_with_quantity_one() {
  setup_tracing();
  let f = signed_in_fixture().await;

  let item = f.cart.add(f.product_a.id).await.unwrap();

  assert_eq!(item.quantity, 1);
  assert_eq!(item.product.price_cents, 500);
  assert_eq!(f.cart.items(), vec![item.clone()]);
  assert_eq!(f.gateway.stored_cart(f.user_id), vec![(item.id, f.product_a.id, 1)]);
  // Appended from the insert response, no reload.
  assert_eq!(f.gateway.call_count(RemoteOp::FetchCart), 1);
}

#[tokio::test]
#[serial]
async fn test_add_existing_product_increments_by_one() {
  setup_tracing();
  let f = signed_in_fixture().await;
  let first = f.cart.add(f.product_a.id).await.unwrap();

  let second = f.cart.add(f.product_a.id).await.unwrap();

  assert_eq!(second.id, first.id);
  assert_eq!(second.quantity, 2);
  assert_eq!(f.cart.items().len(), 1);
  assert_eq!(f.gateway.stored_cart(f.user_id), vec![(first.id, f.product_a.id, 2)]);
  assert_eq!(f.gateway.call_count(RemoteOp::InsertCartItem), 1);
}

#[tokio::test]
#[serial]
async fn test_concurrent_adds_of_same_product_do_not_duplicate() {
  setup_tracing();
  let f = signed_in_fixture().await;

  let mut handles = Vec::new();
  for _ in 0..8 {
    let cart = f.cart.clone();
    let product_id = f.product_a.id;
    handles.push(tokio::spawn(async move { cart.add(product_id).await }));
  }
  for handle in handles {
    handle.await.unwrap().unwrap();
  }

  let stored = f.gateway.stored_cart(f.user_id);
  assert_eq!(stored.len(), 1);
  assert_eq!(stored[0].2, 8);
  assert_eq!(f.cart.total_items(), 8);
}

#[tokio::test]
#[serial]
async fn test_totals_follow_every_mutation() {
  setup_tracing();
  let f = signed_in_fixture().await;

  let a = f.cart.add(f.product_a.id).await.unwrap();
  assert_totals_consistent(&f.cart);
  f.cart.add(f.product_a.id).await.unwrap();
  assert_totals_consistent(&f.cart);
  let b = f.cart.add(f.product_b.id).await.unwrap();
  assert_totals_consistent(&f.cart);
  assert_eq!(f.cart.total_items(), 3);
  assert_eq!(f.cart.total_price_cents(), 1300);

  f.cart.set_quantity(b.id, 4).await.unwrap();
  assert_totals_consistent(&f.cart);
  assert_eq!(f.cart.total_price_cents(), 2 * 500 + 4 * 300);

  f.cart.remove(a.id).await.unwrap();
  assert_totals_consistent(&f.cart);
  assert_eq!(f.cart.total_items(), 4);
  assert_eq!(f.cart.total_price_cents(), 1200);
}

#[tokio::test]
#[serial]
async fn test_set_quantity_below_one_behaves_like_remove() {
  setup_tracing();
  for quantity in [0, -3] {
    let f = signed_in_fixture().await;
    let a = f.cart.add(f.product_a.id).await.unwrap();
    let b = f.cart.add(f.product_b.id).await.unwrap();

    let result = f.cart.set_quantity(a.id, quantity).await.unwrap();

    assert_eq!(result, None);
    assert_eq!(f.cart.items(), vec![b.clone()]);
    assert_eq!(f.gateway.stored_cart(f.user_id), vec![(b.id, f.product_b.id, 1)]);
    assert_eq!(f.gateway.call_count(RemoteOp::DeleteCartItem), 1);
    assert_eq!(f.gateway.call_count(RemoteOp::UpdateCartItem), 0);
  }
}

#[tokio::test]
#[serial]
async fn test_mutations_without_user_are_unauthorized() {
  setup_tracing();
  let gateway = Arc::new(InMemoryGateway::with_products([product("A", 500)]));
  let cart = CartStore::new(gateway.clone());
  cart.load(None).await;

  assert!(matches!(cart.add(Uuid::new_v4()).await, Err(BasketError::Unauthorized { .. })));
  assert!(matches!(cart.remove(Uuid::new_v4()).await, Err(BasketError::Unauthorized { .. })));
  assert!(matches!(
    cart.set_quantity(Uuid::new_v4(), 2).await,
    Err(BasketError::Unauthorized { .. })
  ));
  assert!(matches!(cart.clear().await, Err(BasketError::Unauthorized { .. })));
  assert!(gateway.calls().is_empty());
  assert_eq!(cart.status(), ReplicaStatus::Idle);
}

#[tokio::test]
#[serial]
async fn test_load_replaces_local_set_and_none_resets() {
  setup_tracing();
  let f = signed_in_fixture().await;
  f.cart.add(f.product_a.id).await.unwrap();
  // Another device adds B behind this replica's back.
  f.gateway.seed_cart_row(f.user_id, f.product_b.id, 3);

  f.cart.load(Some(f.user_id)).await;
  assert_eq!(f.cart.items().len(), 2);
  assert_eq!(f.cart.total_items(), 4);
  assert_eq!(f.cart.status(), ReplicaStatus::Ready);

  f.cart.load(None).await;
  assert!(f.cart.is_empty());
  assert_eq!(f.cart.user_id(), None);
  assert_eq!(f.cart.status(), ReplicaStatus::Idle);
}

#[tokio::test]
#[serial]
async fn test_load_failure_degrades_to_empty_cart() {
  setup_tracing();
  let f = signed_in_fixture().await;
  f.cart.add(f.product_a.id).await.unwrap();

  f.gateway.fail_next(RemoteOp::FetchCart);
  f.cart.load(Some(f.user_id)).await;

  assert!(f.cart.is_empty());
  assert_eq!(f.cart.total_price_cents(), 0);
  assert_eq!(f.cart.status(), ReplicaStatus::Degraded);
  // The remote row is still there; a later load finds it.
  f.cart.load(Some(f.user_id)).await;
  assert_eq!(f.cart.total_items(), 1);
}

#[tokio::test]
#[serial]
async fn test_refresh_failure_is_reported_and_keeps_replica() {
  setup_tracing();
  let f = signed_in_fixture().await;
  f.cart.add(f.product_a.id).await.unwrap();

  f.gateway.fail_next(RemoteOp::FetchCart);
  let result = f.cart.refresh().await;

  assert!(matches!(
    result,
    Err(BasketError::RemoteRead {
      op: RemoteOp::FetchCart,
      source: GatewayError::Unavailable(_)
    })
  ));
  assert_eq!(f.cart.total_items(), 1);
}

#[tokio::test]
#[serial]
async fn test_failed_remote_writes_leave_replica_untouched() {
  setup_tracing();
  let f = signed_in_fixture().await;
  let a = f.cart.add(f.product_a.id).await.unwrap();
  let before = f.cart.items();

  f.gateway.fail_next(RemoteOp::UpdateCartItem);
  let update = f.cart.set_quantity(a.id, 5).await;
  assert!(matches!(
    update,
    Err(BasketError::RemoteWrite {
      op: RemoteOp::UpdateCartItem,
      ..
    })
  ));
  assert_eq!(f.cart.items(), before);

  f.gateway.fail_next(RemoteOp::DeleteCartItem);
  assert!(f.cart.remove(a.id).await.is_err());
  assert_eq!(f.cart.items(), before);

  f.gateway.fail_next(RemoteOp::ClearCart);
  assert!(f.cart.clear().await.is_err());
  assert_eq!(f.cart.items(), before);

  f.gateway.fail_next(RemoteOp::InsertCartItem);
  assert!(f.cart.add(f.product_b.id).await.is_err());
  assert_eq!(f.cart.items(), before);

  // Replica and store still agree.
  assert_eq!(f.gateway.stored_cart(f.user_id), vec![(a.id, f.product_a.id, 1)]);
}

#[tokio::test]
#[serial]
async fn test_update_of_row_deleted_elsewhere_resynchronizes() {
  setup_tracing();
  let f = signed_in_fixture().await;
  let a = f.cart.add(f.product_a.id).await.unwrap();
  // Deleted from another session; this replica still shows it.
  let other = CartStore::new(f.gateway.clone());
  other.load(Some(f.user_id)).await;
  other.remove(a.id).await.unwrap();

  let result = f.cart.set_quantity(a.id, 3).await;

  assert!(matches!(result, Err(BasketError::ItemNotFound { item_id }) if item_id == a.id));
  assert!(f.cart.is_empty());
}

#[tokio::test]
#[serial]
async fn test_unknown_item_is_not_found_without_remote_call() {
  setup_tracing();
  let f = signed_in_fixture().await;
  let calls_before = f.gateway.calls().len();
  let missing = Uuid::new_v4();

  assert!(matches!(f.cart.remove(missing).await, Err(BasketError::ItemNotFound { .. })));
  assert!(matches!(
    f.cart.set_quantity(missing, 2).await,
    Err(BasketError::ItemNotFound { .. })
  ));
  assert_eq!(f.gateway.calls().len(), calls_before);
}

#[tokio::test]
#[serial]
async fn test_add_of_unknown_product_is_rejected_by_store() {
  setup_tracing();
  let f = signed_in_fixture().await;

  let result = f.cart.add(Uuid::new_v4()).await;

  assert!(matches!(
    result,
    Err(BasketError::RemoteWrite {
      op: RemoteOp::InsertCartItem,
      source: GatewayError::Rejected { .. }
    })
  ));
  assert!(f.cart.is_empty());
}

#[tokio::test]
#[serial]
async fn test_clear_empties_remote_and_local() {
  setup_tracing();
  let f = signed_in_fixture().await;
  f.cart.add(f.product_a.id).await.unwrap();
  f.cart.add(f.product_b.id).await.unwrap();
  let stranger = Uuid::new_v4();
  f.gateway.seed_cart_row(stranger, f.product_a.id, 1);

  f.cart.clear().await.unwrap();

  assert!(f.cart.is_empty());
  assert!(f.gateway.stored_cart(f.user_id).is_empty());
  // Other users' rows are untouched.
  assert_eq!(f.gateway.stored_cart(stranger).len(), 1);
}

#[tokio::test]
#[serial]
async fn test_cart_rows_are_scoped_to_owner() {
  setup_tracing();
  let f = signed_in_fixture().await;
  let stranger = Uuid::new_v4();
  f.gateway.seed_cart_row(stranger, f.product_b.id, 2);

  f.cart.load(Some(f.user_id)).await;

  assert!(f.cart.is_empty());
}

#[tokio::test]
#[serial]
async fn test_add_past_max_quantity_is_rejected_without_write() {
  setup_tracing();
  let f = signed_in_fixture().await;
  let a = f.cart.add(f.product_a.id).await.unwrap();
  f.cart.set_quantity(a.id, i32::MAX).await.unwrap();
  let updates_before = f.gateway.call_count(RemoteOp::UpdateCartItem);

  let result = f.cart.add(f.product_a.id).await;

  assert!(matches!(
    result,
    Err(BasketError::QuantityOutOfRange { item_id, quantity }) if item_id == a.id && quantity == i32::MAX
  ));
  assert_eq!(f.gateway.call_count(RemoteOp::UpdateCartItem), updates_before);
  assert_eq!(f.gateway.stored_cart(f.user_id), vec![(a.id, f.product_a.id, i32::MAX)]);
  assert_eq!(f.cart.item(a.id).unwrap().quantity, i32::MAX);
  assert_totals_consistent(&f.cart);
}

#[tokio::test]
#[serial]
async fn test_add_of_line_created_elsewhere_resynchronizes_and_increments() {
  setup_tracing();
  let f = signed_in_fixture().await;
  // Added from another device after this replica loaded.
  let remote_id = f.gateway.seed_cart_row(f.user_id, f.product_a.id, 1);

  let first = f.cart.add(f.product_a.id).await.unwrap();

  assert_eq!(first.id, remote_id);
  assert_eq!(first.quantity, 2);
  assert_eq!(f.cart.items().len(), 1);
  assert_eq!(f.cart.status(), ReplicaStatus::Ready);
  assert_eq!(f.gateway.stored_cart(f.user_id), vec![(remote_id, f.product_a.id, 2)]);

  let second = f.cart.add(f.product_a.id).await.unwrap();
  assert_eq!(second.quantity, 3);
  assert_eq!(f.gateway.call_count(RemoteOp::InsertCartItem), 1);
  assert_totals_consistent(&f.cart);
}
