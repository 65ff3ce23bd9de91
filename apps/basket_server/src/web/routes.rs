// apps/basket_server/src/web/routes.rs

use crate::state::AppState;
use crate::web::handlers::{cart_handlers, checkout_handlers, order_handlers};
use actix_web::{web, HttpResponse};

async fn health_check_handler(app_state: web::Data<AppState>) -> HttpResponse {
  let store = if app_state.config.database_url.is_some() {
    "postgres"
  } else {
    "memory"
  };
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok", "store": store }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::get_cart_handler))
          .route("", web::delete().to(cart_handlers::clear_cart_handler))
          .route("/items", web::post().to(cart_handlers::add_item_handler))
          .route("/items/{item_id}", web::put().to(cart_handlers::set_quantity_handler))
          .route("/items/{item_id}", web::delete().to(cart_handlers::remove_item_handler)),
      )
      .route("/checkout", web::post().to(checkout_handlers::checkout_handler))
      .route("/orders", web::get().to(order_handlers::list_orders_handler)),
  );
}
