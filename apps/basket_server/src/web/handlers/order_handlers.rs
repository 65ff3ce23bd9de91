// apps/basket_server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CurrentUser;

/// Past orders, newest first. Signed out or unreadable history is an empty list.
#[instrument(name = "handler::list_orders", skip(app_state))]
pub async fn list_orders_handler(app_state: web::Data<AppState>, user: CurrentUser) -> Result<HttpResponse, AppError> {
  let orders = app_state.history.orders(user.0).await;
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}
