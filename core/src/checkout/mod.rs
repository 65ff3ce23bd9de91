// basket/src/checkout/mod.rs

//! Cart → order conversion as a compensating pipeline.

pub mod context;
pub mod coordinator;
pub mod steps;

pub use context::CheckoutCtxData;
pub use coordinator::{CheckoutCoordinator, CheckoutOutcome, PlacedOrder};
