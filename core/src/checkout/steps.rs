// basket/src/checkout/steps.rs

//! The checkout pipeline: snapshot, order row, order item rows, cart clear. Each write has
//! a compensation so a failure part-way leaves neither an orphan order nor a lost cart.

use crate::checkout::context::CheckoutCtxData;
use crate::core::{ContextData, PipelineControl};
use crate::error::{BasketError, BasketResult};
use crate::gateway::RemoteOp;
use crate::model::{self, NewOrder, NewOrderItem, OrderStatus};
use crate::pipeline::Pipeline;
use tracing::{event, instrument, Level};

pub const SNAPSHOT_CART: &str = "snapshot_cart";
pub const INSERT_ORDER: &str = "insert_order";
pub const INSERT_ORDER_ITEMS: &str = "insert_order_items";
pub const CLEAR_CART: &str = "clear_cart";

pub fn build_checkout_pipeline() -> Pipeline<CheckoutCtxData, BasketError> {
  let mut p = Pipeline::<CheckoutCtxData, BasketError>::new(&[
    (SNAPSHOT_CART, false),
    (INSERT_ORDER, false),
    (INSERT_ORDER_ITEMS, false),
    (CLEAR_CART, false),
  ]);

  p.on_root(SNAPSHOT_CART, snapshot_cart);
  p.on_root(INSERT_ORDER, insert_order);
  p.compensate_root(INSERT_ORDER, delete_order);
  p.on_root(INSERT_ORDER_ITEMS, insert_order_items);
  p.compensate_root(INSERT_ORDER_ITEMS, delete_order_items);
  p.on_root(CLEAR_CART, clear_cart);
  p
}

/// Freezes the cart lines and total. An empty cart stops the run before any write.
async fn snapshot_cart(ctx_data: ContextData<CheckoutCtxData>) -> BasketResult<PipelineControl> {
  let mut guard = ctx_data.write();
  let items = guard.cart.items();
  if items.is_empty() {
    event!(Level::INFO, user_id = %guard.user_id, "Cart is empty; nothing to check out.");
    return Ok(PipelineControl::Stop);
  }
  guard.total_amount_cents = model::total_price_cents(&items);
  guard.items = items;
  event!(
    Level::INFO,
    line_count = guard.items.len(),
    total_amount_cents = guard.total_amount_cents,
    "Cart snapshot taken."
  );
  Ok(PipelineControl::Continue)
}

#[instrument(name = "checkout::insert_order", skip_all, err(Display))]
async fn insert_order(ctx_data: ContextData<CheckoutCtxData>) -> BasketResult<PipelineControl> {
  let (gateway, new_order) = ctx_data.with(|c| {
    (
      c.gateway.clone(),
      NewOrder {
        user_id: c.user_id,
        total_amount_cents: c.total_amount_cents,
        status: OrderStatus::Confirmed,
      },
    )
  });

  let order = gateway
    .insert_order(new_order)
    .await
    .map_err(BasketError::write(RemoteOp::InsertOrder))?;
  event!(Level::INFO, order_id = %order.id, "Order row created.");
  ctx_data.write().order = Some(order);
  Ok(PipelineControl::Continue)
}

async fn delete_order(ctx_data: ContextData<CheckoutCtxData>) -> BasketResult<()> {
  let (gateway, order_id) = ctx_data.with(|c| (c.gateway.clone(), c.order_id()));
  let Some(order_id) = order_id else {
    return Ok(());
  };
  gateway
    .delete_order(order_id)
    .await
    .map_err(BasketError::write(RemoteOp::DeleteOrder))?;
  event!(Level::WARN, %order_id, "Order row rolled back.");
  ctx_data.write().order_rolled_back = true;
  Ok(())
}

#[instrument(name = "checkout::insert_order_items", skip_all, err(Display))]
async fn insert_order_items(ctx_data: ContextData<CheckoutCtxData>) -> BasketResult<PipelineControl> {
  let (gateway, new_items) = ctx_data.with(|c| {
    let order_id = c
      .order_id()
      .ok_or_else(|| BasketError::Internal("order items step ran without an order".to_string()))?;
    let new_items: Vec<NewOrderItem> = c
      .items
      .iter()
      .map(|item| NewOrderItem {
        order_id,
        product_id: item.product_id,
        quantity: item.quantity,
        price_at_purchase_cents: item.product.price_cents,
      })
      .collect();
    Ok::<_, BasketError>((c.gateway.clone(), new_items))
  })?;

  let stored = gateway
    .insert_order_items(new_items)
    .await
    .map_err(BasketError::write(RemoteOp::InsertOrderItems))?;
  event!(Level::INFO, item_count = stored.len(), "Order items recorded.");
  ctx_data.write().order_items = stored;
  Ok(PipelineControl::Continue)
}

async fn delete_order_items(ctx_data: ContextData<CheckoutCtxData>) -> BasketResult<()> {
  let (gateway, order_id) = ctx_data.with(|c| (c.gateway.clone(), c.order_id()));
  let Some(order_id) = order_id else {
    return Ok(());
  };
  gateway
    .delete_order_items(order_id)
    .await
    .map_err(BasketError::write(RemoteOp::DeleteOrderItems))?;
  ctx_data.write().order_items.clear();
  Ok(())
}

/// The coordinator already holds the cart's write gate, so this uses the unguarded clear.
async fn clear_cart(ctx_data: ContextData<CheckoutCtxData>) -> BasketResult<PipelineControl> {
  let (cart, user_id) = ctx_data.with(|c| (c.cart.clone(), c.user_id));
  cart.clear_locked(user_id).await?;
  Ok(PipelineControl::Continue)
}
