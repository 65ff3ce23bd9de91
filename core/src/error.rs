// basket/src/error.rs
use crate::gateway::RemoteOp;
use anyhow::Error as AnyhowError;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the step engine itself, as opposed to the handlers it runs.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Compensation for step '{step_name}' failed after '{cause}'. Source: {source}")]
  CompensationFailed {
    step_name: String,
    /// Display form of the step error that triggered the rollback.
    cause: String,
    #[source]
    source: AnyhowError,
  },

  #[error("Error in step handler. Source: {source}")]
  Handler {
    #[source]
    source: AnyhowError,
  },
}

impl From<AnyhowError> for PipelineError {
  fn from(err: AnyhowError) -> Self {
    PipelineError::Handler { source: err }
  }
}

/// Failure reported by a `RemoteCartGateway`.
#[derive(Debug, Error)]
pub enum GatewayError {
  /// The store refused the row (constraint, foreign key, missing parent...).
  #[error("{collection} rejected the request: {message}")]
  Rejected { collection: &'static str, message: String },

  #[error("Remote store unavailable: {0}")]
  Unavailable(String),

  #[error(transparent)]
  Backend(#[from] AnyhowError),
}

/// Domain errors surfaced by `CartStore`, `CheckoutCoordinator` and `OrderHistoryReader`.
#[derive(Debug, Error)]
pub enum BasketError {
  /// A mutating operation was attempted without a signed-in user. Nothing was written.
  #[error("Sign in required to {operation}")]
  Unauthorized { operation: &'static str },

  #[error("Cart item {item_id} is not in the cart")]
  ItemNotFound { item_id: Uuid },

  #[error("Cart item {item_id} cannot go past quantity {quantity}")]
  QuantityOutOfRange { item_id: Uuid, quantity: i32 },

  /// An insert/update/delete against the store failed. Steps committed before it stay
  /// committed unless a compensation removed them.
  #[error("Could not {op}: {source}")]
  RemoteWrite {
    op: RemoteOp,
    #[source]
    source: GatewayError,
  },

  #[error("Could not {op}: {source}")]
  RemoteRead {
    op: RemoteOp,
    #[source]
    source: GatewayError,
  },

  /// Checkout failed and its rollback failed too: `order_id` is persisted in some partial
  /// state and needs manual attention.
  #[error("Checkout left order {order_id} partially written: {source}")]
  CheckoutIncomplete {
    order_id: Uuid,
    #[source]
    source: PipelineError,
  },

  #[error("Checkout workflow error: {source}")]
  Workflow {
    #[from]
    source: PipelineError,
  },

  #[error("Internal error: {0}")]
  Internal(String),
}

impl BasketError {
  pub(crate) fn write(op: RemoteOp) -> impl FnOnce(GatewayError) -> BasketError {
    move |source| BasketError::RemoteWrite { op, source }
  }

  pub(crate) fn read(op: RemoteOp) -> impl FnOnce(GatewayError) -> BasketError {
    move |source| BasketError::RemoteRead { op, source }
  }
}

pub type BasketResult<T, E = BasketError> = std::result::Result<T, E>;
