// basket/src/checkout/coordinator.rs

use crate::cart::CartStore;
use crate::checkout::context::CheckoutCtxData;
use crate::checkout::steps::build_checkout_pipeline;
use crate::core::{ContextData, PipelineResult};
use crate::error::{BasketError, BasketResult, PipelineError};
use crate::model::{Order, OrderItem};
use crate::pipeline::Pipeline;
use serde::Serialize;
use std::sync::Arc;
use tracing::{event, instrument, Level};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedOrder {
  pub order: Order,
  pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckoutOutcome {
  /// Order and items were written and the cart is empty.
  Placed(PlacedOrder),
  /// The cart had no lines; nothing was written.
  EmptyCart,
}

/// Turns the current contents of a `CartStore` into a persisted order.
///
/// The run holds the cart's write gate from snapshot to clear, so no cart mutation can
/// land between the totals being read and the cart being emptied.
pub struct CheckoutCoordinator {
  cart: Arc<CartStore>,
  pipeline: Pipeline<CheckoutCtxData, BasketError>,
}

impl CheckoutCoordinator {
  pub fn new(cart: Arc<CartStore>) -> Self {
    Self {
      cart,
      pipeline: build_checkout_pipeline(),
    }
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.pipeline.step_names()
  }

  /// Runs checkout for the signed-in user of the cart.
  ///
  /// - no user: `Unauthorized`, nothing written;
  /// - empty cart: `Ok(EmptyCart)`, nothing written;
  /// - a write fails: the writes before it are undone and the write's `RemoteWrite` error is
  ///   returned with the cart untouched;
  /// - the undo itself fails: `CheckoutIncomplete` naming the order left behind.
  #[instrument(name = "CheckoutCoordinator::checkout", skip(self), err(Display))]
  pub async fn checkout(&self) -> BasketResult<CheckoutOutcome> {
    let _gate = self.cart.write_lock().await;
    let user_id = self
      .cart
      .user_id()
      .ok_or(BasketError::Unauthorized { operation: "check out" })?;

    let ctx_data = ContextData::new(CheckoutCtxData::new(Arc::clone(&self.cart), user_id));
    let run = self.pipeline.run(ctx_data.clone()).await;

    match run {
      Ok(PipelineResult::Stopped) => Ok(CheckoutOutcome::EmptyCart),
      Ok(PipelineResult::Completed) => {
        let (order, items) = ctx_data.with(|c| (c.order.clone(), c.order_items.clone()));
        let order = order.ok_or_else(|| BasketError::Internal("checkout completed without an order".to_string()))?;
        event!(
          Level::INFO,
          order_id = %order.id,
          total_amount_cents = order.total_amount_cents,
          item_count = items.len(),
          "Checkout completed."
        );
        Ok(CheckoutOutcome::Placed(PlacedOrder { order, items }))
      }
      Err(BasketError::Workflow {
        source: source @ PipelineError::CompensationFailed { .. },
      }) => match ctx_data.with(|c| c.order_id()) {
        Some(order_id) => {
          event!(Level::ERROR, %order_id, error = %source, "Checkout rollback incomplete.");
          Err(BasketError::CheckoutIncomplete { order_id, source })
        }
        None => Err(BasketError::Workflow { source }),
      },
      Err(e) => {
        let rolled_back = ctx_data.with(|c| c.order_rolled_back);
        event!(Level::WARN, error = %e, rolled_back, "Checkout failed.");
        Err(e)
      }
    }
  }
}
