// basket/src/pipeline/execution.rs

//! `Pipeline::run()`: step execution and reverse-order compensation on failure.

use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::core::step::StepDef;
use crate::error::PipelineError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, instrument, span, Instrument, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Executes the pipeline against `ctx_data`.
  ///
  /// - `Ok(Completed)`: every step ran.
  /// - `Ok(Stopped)`: a handler returned `Stop`; earlier steps are kept as they are.
  /// - `Err(e)`: a step failed. Completed steps were compensated newest-first and `e` is
  ///   the step's own error. If a compensation fails, compensation halts there and the
  ///   error is `PipelineError::CompensationFailed` carrying both causes.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      pipeline_context_data_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");
    let mut completed: Vec<&StepDef> = Vec::with_capacity(self.steps.len());

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_span = span!(
        Level::INFO,
        "pipeline_step",
        step_name = step_def.name.as_str(),
        step_index = step_idx,
        optional = step_def.optional
      );

      match self.run_step(step_def, ctx_data.clone()).instrument(step_span).await {
        Ok(PipelineControl::Continue) => completed.push(step_def),
        Ok(PipelineControl::Stop) => {
          event!(Level::INFO, step_name = %step_def.name, "Pipeline stopped by a handler.");
          return Ok(PipelineResult::Stopped);
        }
        Err(e) => {
          event!(Level::ERROR, step_name = %step_def.name, error = %e, "Step failed.");
          return Err(self.compensate(&completed, ctx_data, e).await);
        }
      }
    }

    event!(Level::DEBUG, "Pipeline execution completed successfully.");
    Ok(PipelineResult::Completed)
  }

  async fn run_step(&self, step_def: &StepDef, ctx_data: ContextData<TData>) -> Result<PipelineControl, Err> {
    let handlers = match self.on.get(&step_def.name) {
      Some(handlers) if !handlers.is_empty() => handlers,
      _ if step_def.optional => {
        event!(Level::DEBUG, "Optional step has no handlers, skipping.");
        return Ok(PipelineControl::Continue);
      }
      _ => {
        return Err(Err::from(PipelineError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }
    };

    for (handler_idx, handler_fn) in handlers.iter().enumerate() {
      event!(Level::TRACE, handler_index = handler_idx, "Executing 'on' handler.");
      if handler_fn(ctx_data.clone()).await? == PipelineControl::Stop {
        return Ok(PipelineControl::Stop);
      }
    }
    Ok(PipelineControl::Continue)
  }

  /// Runs compensations of `completed` newest-first and returns the error to surface.
  async fn compensate(&self, completed: &[&StepDef], ctx_data: ContextData<TData>, cause: Err) -> Err {
    for step_def in completed.iter().rev() {
      let Some(compensations) = self.compensations.get(&step_def.name) else {
        continue;
      };
      for compensation_fn in compensations.iter().rev() {
        event!(Level::WARN, step_name = %step_def.name, "Compensating completed step.");
        if let Err(compensation_err) = compensation_fn(ctx_data.clone()).await {
          event!(
            Level::ERROR,
            step_name = %step_def.name,
            error = %compensation_err,
            "Compensation failed; remaining compensations skipped."
          );
          return Err::from(PipelineError::CompensationFailed {
            step_name: step_def.name.clone(),
            cause: cause.to_string(),
            source: anyhow::Error::new(compensation_err),
          });
        }
      }
    }
    cause
  }
}
