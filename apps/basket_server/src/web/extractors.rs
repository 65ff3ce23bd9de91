// apps/basket_server/src/web/extractors.rs

use crate::errors::AppError;
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use basket::BasketError;
use futures_util::future::{ready, Ready};
use tracing::debug;
use uuid::Uuid;

/// Identity is established upstream; the caller's opaque id arrives in this header.
pub const USER_ID_HEADER: &str = "X-User-ID";

/// The caller's user id, or `None` when the header is missing or not a UUID.
///
/// Never rejects the request by itself: reads degrade to empty results and mutations
/// call `require`.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Option<Uuid>);

impl CurrentUser {
  pub fn require(&self, operation: &'static str) -> Result<Uuid, AppError> {
    self
      .0
      .ok_or(AppError::Basket(BasketError::Unauthorized { operation }))
  }
}

impl FromRequest for CurrentUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let user_id = req
      .headers()
      .get(USER_ID_HEADER)
      .and_then(|value| value.to_str().ok())
      .and_then(|raw| Uuid::parse_str(raw.trim()).ok());
    if user_id.is_none() && req.headers().contains_key(USER_ID_HEADER) {
      debug!("Ignoring malformed {} header.", USER_ID_HEADER);
    }
    ready(Ok(CurrentUser(user_id)))
  }
}
