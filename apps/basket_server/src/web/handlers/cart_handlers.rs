// apps/basket_server/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use basket::{CartItem, CartStore, ReplicaStatus};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CurrentUser;

/// What the client renders: the replica's items and the totals derived from them.
#[derive(Debug, Serialize)]
pub struct CartView {
  pub user_id: Option<Uuid>,
  pub items: Vec<CartItem>,
  pub total_items: i64,
  pub total_price_cents: i64,
  pub status: ReplicaStatus,
}

impl CartView {
  pub fn of(cart: &CartStore) -> Self {
    Self {
      user_id: cart.user_id(),
      items: cart.items(),
      total_items: cart.total_items(),
      total_price_cents: cart.total_price_cents(),
      status: cart.status(),
    }
  }

  pub fn signed_out() -> Self {
    Self {
      user_id: None,
      items: Vec::new(),
      total_items: 0,
      total_price_cents: 0,
      status: ReplicaStatus::Idle,
    }
  }
}

#[derive(Deserialize, Debug)]
pub struct AddItemPayload {
  pub product_id: Uuid,
}

#[derive(Deserialize, Debug)]
pub struct SetQuantityPayload {
  pub quantity: i32,
}

#[instrument(name = "handler::get_cart", skip(app_state))]
pub async fn get_cart_handler(app_state: web::Data<AppState>, user: CurrentUser) -> Result<HttpResponse, AppError> {
  let Some(user_id) = user.0 else {
    return Ok(HttpResponse::Ok().json(CartView::signed_out()));
  };
  let cart = app_state.carts.reloaded(user_id).await;
  Ok(HttpResponse::Ok().json(CartView::of(&cart)))
}

#[instrument(
  name = "handler::add_item",
  skip(app_state, payload),
  fields(product_id = %payload.product_id)
)]
pub async fn add_item_handler(
  app_state: web::Data<AppState>,
  user: CurrentUser,
  payload: web::Json<AddItemPayload>,
) -> Result<HttpResponse, AppError> {
  let user_id = user.require("add items to the cart")?;
  let cart = app_state.carts.cart_for(user_id).await;
  let item = cart.add(payload.product_id).await?;
  info!(item_id = %item.id, quantity = item.quantity, "Item added to cart.");
  Ok(HttpResponse::Ok().json(json!({
    "message": "Item added to cart.",
    "cart_item": item,
    "cart": CartView::of(&cart),
  })))
}

#[instrument(name = "handler::set_quantity", skip(app_state, payload), fields(quantity = payload.quantity))]
pub async fn set_quantity_handler(
  app_state: web::Data<AppState>,
  user: CurrentUser,
  path: web::Path<Uuid>,
  payload: web::Json<SetQuantityPayload>,
) -> Result<HttpResponse, AppError> {
  let user_id = user.require("change cart quantities")?;
  let item_id = path.into_inner();
  let cart = app_state.carts.cart_for(user_id).await;
  let item = cart.set_quantity(item_id, payload.quantity).await?;
  let message = if item.is_some() {
    "Quantity updated."
  } else {
    "Item removed from cart."
  };
  Ok(HttpResponse::Ok().json(json!({
    "message": message,
    "cart_item": item,
    "cart": CartView::of(&cart),
  })))
}

#[instrument(name = "handler::remove_item", skip(app_state))]
pub async fn remove_item_handler(
  app_state: web::Data<AppState>,
  user: CurrentUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let user_id = user.require("remove items from the cart")?;
  let cart = app_state.carts.cart_for(user_id).await;
  cart.remove(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
    "message": "Item removed from cart.",
    "cart": CartView::of(&cart),
  })))
}

#[instrument(name = "handler::clear_cart", skip(app_state))]
pub async fn clear_cart_handler(app_state: web::Data<AppState>, user: CurrentUser) -> Result<HttpResponse, AppError> {
  let user_id = user.require("clear the cart")?;
  let cart = app_state.carts.cart_for(user_id).await;
  cart.clear().await?;
  let view = CartView::of(&cart);
  drop(cart);
  app_state.carts.release_if_empty(user_id);
  Ok(HttpResponse::Ok().json(json!({
    "message": "Cart cleared.",
    "cart": view,
  })))
}
