// basket/src/core/context.rs

//! The boxed handler type every step and compensation is stored as.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

/// A step handler: an async function over the shared `ContextData<TData>`.
///
/// Handlers receive a clone of the run's context (cheap, `Arc`-backed), take whatever they
/// need under a short-lived lock, release the lock, then await their I/O.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;

/// A compensation: undoes the effect of a step that already completed. Runs only when a
/// later step fails.
pub type Compensation<TData, Err> =
  Box<dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<(), Err>> + Send>> + Send + Sync>;
