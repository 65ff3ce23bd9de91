// basket/src/pipeline/definition.rs

//! The `Pipeline<TData, Err>` struct, its construction and structural modification.

use crate::core::context::{Compensation, Handler};
use crate::core::step::StepDef;
use crate::error::PipelineError;
use std::collections::HashMap;

/// An ordered list of named async steps over a shared `ContextData<TData>`.
///
/// Each step may carry compensations. When a step fails, the compensations of every step
/// that already completed run in reverse order before the error is returned, which is how
/// a multi-write sequence against a row-level store is made all-or-nothing.
///
/// `Err` is the error type handlers return; it must absorb engine errors via
/// `From<PipelineError>`.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) compensations: HashMap<String, Vec<Compensation<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Creates a pipeline from `(name, optional)` pairs, in execution order.
  pub fn new(step_defs: &[(&str, bool)]) -> Self {
    let mut pipeline = Self {
      steps: Vec::with_capacity(step_defs.len()),
      on: HashMap::new(),
      compensations: HashMap::new(),
    };
    for (name, optional) in step_defs {
      pipeline.ensure_step_not_exists(name);
      pipeline.steps.push(StepDef::new(*name, *optional));
    }
    pipeline
  }

  /// Panics if the step is unknown. A typo in a step name is a setup bug, not a runtime error.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!("Pipeline setup error: step '{}' not found.", step_name);
    }
  }

  fn ensure_step_not_exists(&self, step_name: &str) {
    if self.steps.iter().any(|s| s.name == step_name) {
      panic!("Pipeline setup error: step '{}' already exists.", step_name);
    }
  }

  fn position_of(&self, step_name: &str) -> usize {
    self.ensure_step_exists(step_name);
    self
      .steps
      .iter()
      .position(|s| s.name == step_name)
      .unwrap_or_default()
  }

  pub fn insert_before_step<S: Into<String>>(&mut self, existing_step_name: &str, new_step_name: S, optional: bool) {
    let idx = self.position_of(existing_step_name);
    let name: String = new_step_name.into();
    self.ensure_step_not_exists(&name);
    self.steps.insert(idx, StepDef::new(name, optional));
  }

  pub fn insert_after_step<S: Into<String>>(&mut self, existing_step_name: &str, new_step_name: S, optional: bool) {
    let idx = self.position_of(existing_step_name);
    let name: String = new_step_name.into();
    self.ensure_step_not_exists(&name);
    self.steps.insert(idx + 1, StepDef::new(name, optional));
  }

  /// Removes a step with its handlers and compensations. Unknown names are a no-op.
  pub fn remove_step(&mut self, step_name: &str) {
    if let Some(idx) = self.steps.iter().position(|s| s.name == step_name) {
      self.steps.remove(idx);
      self.on.remove(step_name);
      self.compensations.remove(step_name);
    }
  }

  pub fn set_optional(&mut self, step_name: &str, optional: bool) {
    let idx = self.position_of(step_name);
    self.steps[idx].optional = optional;
  }

  /// Step names in execution order.
  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }
}
