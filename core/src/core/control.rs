// stepwise/src/core/control.rs

//! Signals returned by hooks and the overall result of a flow run.

/// Returned by every hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
  /// Run the next hook of this step, then the following steps.
  Proceed,
  /// End the run here. No further hooks of this or any later step execute.
  Halt,
}

/// How a run ended when no hook returned an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  /// Every step ran, was skipped by its predicate, or was optional without hooks.
  Completed,
  /// A hook returned `Control::Halt`.
  Halted,
}

impl Outcome {
  pub fn is_completed(&self) -> bool {
    matches!(self, Outcome::Completed)
  }
}
