// basket/src/lib.rs

//! basket: the cart-state and checkout core of a storefront.
//!
//!  - `CartStore` owns one signed-in user's cart replica and keeps it in step with a
//!    row-level remote store (`RemoteCartGateway`).
//!  - `CheckoutCoordinator` turns the cart into an `Order` plus `OrderItem`s, running the
//!    writes as a compensating pipeline so a failure part-way is rolled back.
//!  - `OrderHistoryReader` reads past orders back.
//!
//! The step engine under `pipeline` is generic and can be used for other multi-write flows.

pub mod cart;
pub mod checkout;
pub mod core;
pub mod error;
pub mod gateway;
pub mod history;
pub mod model;
pub mod pipeline;

pub use crate::core::context::{Compensation, Handler};
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::StepDef;

pub use crate::pipeline::definition::Pipeline;

pub use crate::cart::{CartStore, ReplicaStatus};
pub use crate::checkout::{CheckoutCoordinator, CheckoutOutcome, PlacedOrder};
pub use crate::error::{BasketError, BasketResult, GatewayError, PipelineError};
pub use crate::gateway::{InMemoryGateway, RemoteCartGateway, RemoteOp};
pub use crate::history::OrderHistoryReader;
pub use crate::model::{
  CartItem, NewOrder, NewOrderItem, Order, OrderItem, OrderLine, OrderStatus, OrderSummary, Product, ProductSnapshot,
};
