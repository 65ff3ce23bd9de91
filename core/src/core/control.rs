// basket/src/core/control.rs

//! Signals a step handler returns, and the outcome of a whole pipeline run.

/// Signal from a handler telling the engine whether to go on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  /// Proceed to the next handler / step.
  Continue,
  /// Halt the pipeline here. Nothing after this handler runs and nothing is compensated:
  /// stopping is a normal outcome, not a failure.
  Stop,
}

/// Outcome of a pipeline run that did not return an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  /// Every step ran.
  Completed,
  /// A handler returned `PipelineControl::Stop`.
  Stopped,
}
