// apps/basket_server/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use basket::{CheckoutCoordinator, CheckoutOutcome};
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CurrentUser;

#[instrument(name = "handler::checkout", skip(app_state))]
pub async fn checkout_handler(app_state: web::Data<AppState>, user: CurrentUser) -> Result<HttpResponse, AppError> {
  let user_id = user.require("check out")?;
  let cart = app_state.carts.cart_for(user_id).await;

  let outcome = CheckoutCoordinator::new(cart).checkout().await?;
  match outcome {
    CheckoutOutcome::Placed(placed) => {
      info!(order_id = %placed.order.id, "Order placed.");
      app_state.carts.release_if_empty(user_id);
      Ok(HttpResponse::Created().json(json!({
        "message": "Order placed.",
        "order": placed.order,
        "items": placed.items,
      })))
    }
    CheckoutOutcome::EmptyCart => Ok(HttpResponse::Ok().json(json!({
      "message": "Cart is empty; nothing to check out.",
      "outcome": "empty_cart",
    }))),
  }
}
