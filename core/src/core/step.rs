// basket/src/core/step.rs

//! A single named step within a pipeline.

/// Definition of a pipeline step.
///
/// A non-optional step without an `on` handler fails the run; an optional one is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDef {
  pub name: String,
  pub optional: bool,
}

impl StepDef {
  pub fn new(name: impl Into<String>, optional: bool) -> Self {
    Self {
      name: name.into(),
      optional,
    }
  }
}
