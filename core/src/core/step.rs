// stepwise/src/core/step.rs

use super::Shared;
use std::sync::Arc;

/// Predicate evaluated before a step; `true` skips the step entirely.
pub type SkipPredicate<T> = Arc<dyn Fn(&Shared<T>) -> bool + Send + Sync + 'static>;

/// Declaration of one named step of a flow.
#[derive(Clone)]
pub struct StepSpec<T: 'static + Send + Sync> {
  pub name: String,
  /// Optional steps may have no hooks, and a failing hook on an optional step
  /// is logged instead of failing the run.
  pub optional: bool,
  pub skip_if: Option<SkipPredicate<T>>,
}

impl<T: 'static + Send + Sync> StepSpec<T> {
  pub fn required(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      optional: false,
      skip_if: None,
    }
  }

  pub fn optional(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      optional: true,
      skip_if: None,
    }
  }

  pub(crate) fn should_skip(&self, ctx: &Shared<T>) -> bool {
    self.skip_if.as_ref().map_or(false, |pred| pred(ctx))
  }
}

impl<T: 'static + Send + Sync> std::fmt::Debug for StepSpec<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepSpec")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("has_skip_predicate", &self.skip_if.is_some())
      .finish()
  }
}
