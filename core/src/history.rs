// basket/src/history.rs

//! Read-only view of a user's past orders.

use crate::error::{BasketError, BasketResult};
use crate::gateway::{RemoteCartGateway, RemoteOp};
use crate::model::OrderSummary;
use std::sync::Arc;
use tracing::{event, instrument, Level};
use uuid::Uuid;

pub struct OrderHistoryReader {
  gateway: Arc<dyn RemoteCartGateway>,
}

impl OrderHistoryReader {
  pub fn new(gateway: Arc<dyn RemoteCartGateway>) -> Self {
    Self { gateway }
  }

  /// Orders newest first, each with its lines. No user, or a failed read, gives an empty
  /// list; the failure is only logged.
  pub async fn orders(&self, user_id: Option<Uuid>) -> Vec<OrderSummary> {
    let Some(user_id) = user_id else {
      return Vec::new();
    };
    match self.try_orders(user_id).await {
      Ok(orders) => orders,
      Err(e) => {
        event!(Level::WARN, %user_id, error = %e, "Order history unavailable; showing none.");
        Vec::new()
      }
    }
  }

  /// Like `orders`, but a failed order listing is returned. A failed line listing for a
  /// single order still degrades to an order without lines.
  #[instrument(name = "OrderHistoryReader::try_orders", skip(self), err(Display))]
  pub async fn try_orders(&self, user_id: Uuid) -> BasketResult<Vec<OrderSummary>> {
    let orders = self
      .gateway
      .list_orders(user_id)
      .await
      .map_err(BasketError::read(RemoteOp::ListOrders))?;

    let mut summaries = Vec::with_capacity(orders.len());
    for order in orders {
      let lines = match self.gateway.list_order_lines(order.id).await {
        Ok(lines) => lines,
        Err(e) => {
          event!(Level::WARN, order_id = %order.id, error = %e, "Order lines unavailable.");
          Vec::new()
        }
      };
      summaries.push(OrderSummary { order, lines });
    }
    Ok(summaries)
  }
}
