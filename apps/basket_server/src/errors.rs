// apps/basket_server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use basket::{BasketError, GatewayError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error(transparent)]
  Basket(#[from] BasketError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Basket(err) => match err {
        BasketError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        BasketError::ItemNotFound { .. } => StatusCode::NOT_FOUND,
        BasketError::QuantityOutOfRange { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        BasketError::RemoteWrite {
          source: GatewayError::Rejected { .. },
          ..
        } => StatusCode::UNPROCESSABLE_ENTITY,
        BasketError::RemoteWrite { .. } | BasketError::RemoteRead { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
      },
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Responding with error");
    }

    let body = match self {
      AppError::Sqlx(_) => json!({"error": "Database operation failed"}),
      AppError::Config(m) => json!({"error": "Configuration issue", "detail": m}),
      AppError::Basket(BasketError::CheckoutIncomplete { order_id, .. }) => json!({
        "error": "Checkout could not be completed or rolled back; the order needs attention.",
        "order_id": order_id,
      }),
      other => json!({"error": other.to_string()}),
    };
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
