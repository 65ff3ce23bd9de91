// basket/src/pipeline/hooks.rs

//! Registration of `on` handlers and compensations for pipeline steps.

use crate::core::context::{Compensation, Handler};
use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use crate::error::PipelineError;
use crate::pipeline::definition::Pipeline;
use std::future::Future;
use tracing::{event, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Registers an `on` handler for a step. Several handlers on one step run in
  /// registration order.
  ///
  /// The handler may return any error convertible into the pipeline's `Err`.
  pub fn on_root<F, UserProvidedErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<PipelineControl, UserProvidedErr>> + Send + 'static,
    UserProvidedErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let final_handler: Handler<TData, Err> = Box::new(move |ctx_data| {
      let user_fut = handler_fn(ctx_data);
      Box::pin(async move { user_fut.await.map_err(Into::into) })
    });
    self.on.entry(step_name.to_string()).or_default().push(final_handler);
  }

  /// Registers a compensation for a step.
  ///
  /// It runs only if this step completed and a later step failed. Compensations see the
  /// context as the failing step left it, so whatever they need to undo (ids of rows
  /// written, etc.) must have been recorded there by the step's handler.
  pub fn compensate_root<F, UserProvidedErr>(
    &mut self,
    step_name: &str,
    compensation_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<(), UserProvidedErr>> + Send + 'static,
    UserProvidedErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let final_compensation: Compensation<TData, Err> = Box::new(move |ctx_data| {
      let user_fut = compensation_fn(ctx_data);
      Box::pin(async move { user_fut.await.map_err(Into::into) })
    });
    self
      .compensations
      .entry(step_name.to_string())
      .or_default()
      .push(final_compensation);
    event!(Level::DEBUG, %step_name, "Compensation registered.");
  }
}
