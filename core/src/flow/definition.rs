// stepwise/src/flow/definition.rs

//! The `Flow<T, E>` type and its structural API.

use crate::core::hook::{Hook, Phase};
use crate::core::step::{SkipPredicate, StepSpec};
use crate::core::Shared;
use crate::error::{FlowError, FlowResult};
use std::collections::HashMap;
use std::sync::Arc;

/// An ordered sequence of named steps over a context `T`, whose hooks return
/// `Result<Control, E>`.
///
/// `E` must absorb `FlowError` so that structural failures (a required step
/// without hooks, for instance) come back through the same error type as the
/// hooks' own failures.
pub struct Flow<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepSpec<T>>,
  pub(crate) hooks: HashMap<(String, Phase), Vec<Hook<T, E>>>,
}

impl<T, E> Flow<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      steps: Vec::new(),
      hooks: HashMap::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Appends a required step. Panics if the name is already declared.
  pub fn step(self, name: &str) -> Self {
    self.push_spec(StepSpec::required(name))
  }

  /// Appends an optional step. Panics if the name is already declared.
  pub fn optional_step(self, name: &str) -> Self {
    self.push_spec(StepSpec::optional(name))
  }

  /// Appends a required step that is skipped whenever `skip` returns true.
  pub fn step_unless(self, name: &str, skip: impl Fn(&Shared<T>) -> bool + Send + Sync + 'static) -> Self {
    let mut spec = StepSpec::required(name);
    spec.skip_if = Some(Arc::new(skip));
    self.push_spec(spec)
  }

  fn push_spec(mut self, spec: StepSpec<T>) -> Self {
    if self.position(&spec.name).is_some() {
      panic!("stepwise setup error: step '{}' declared twice in flow '{}'", spec.name, self.name);
    }
    self.steps.push(spec);
    self
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub fn has_step(&self, name: &str) -> bool {
    self.position(name).is_some()
  }

  pub(crate) fn position(&self, name: &str) -> Option<usize> {
    self.steps.iter().position(|s| s.name == name)
  }

  fn require_position(&self, name: &str) -> FlowResult<usize> {
    self.position(name).ok_or_else(|| FlowError::UnknownStep {
      flow: self.name.clone(),
      step: name.to_string(),
    })
  }

  fn reject_duplicate(&self, name: &str) -> FlowResult<()> {
    match self.position(name) {
      Some(_) => Err(FlowError::DuplicateStep {
        flow: self.name.clone(),
        step: name.to_string(),
      }),
      None => Ok(()),
    }
  }

  pub fn insert_before(&mut self, existing: &str, spec: StepSpec<T>) -> FlowResult<()> {
    let idx = self.require_position(existing)?;
    self.reject_duplicate(&spec.name)?;
    self.steps.insert(idx, spec);
    Ok(())
  }

  pub fn insert_after(&mut self, existing: &str, spec: StepSpec<T>) -> FlowResult<()> {
    let idx = self.require_position(existing)?;
    self.reject_duplicate(&spec.name)?;
    self.steps.insert(idx + 1, spec);
    Ok(())
  }

  /// Removes a step together with all of its hooks.
  pub fn remove_step(&mut self, name: &str) -> FlowResult<()> {
    let idx = self.require_position(name)?;
    self.steps.remove(idx);
    self.hooks.retain(|(step, _), _| step != name);
    Ok(())
  }

  pub fn set_optional(&mut self, name: &str, optional: bool) -> FlowResult<()> {
    let idx = self.require_position(name)?;
    self.steps[idx].optional = optional;
    Ok(())
  }

  pub fn set_skip_predicate(&mut self, name: &str, skip_if: Option<SkipPredicate<T>>) -> FlowResult<()> {
    let idx = self.require_position(name)?;
    self.steps[idx].skip_if = skip_if;
    Ok(())
  }

  pub(crate) fn hooks_for(&self, step: &str, phase: Phase) -> &[Hook<T, E>] {
    self
      .hooks
      .get(&(step.to_string(), phase))
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  pub(crate) fn hook_count(&self, step: &str) -> usize {
    Phase::ORDER.iter().map(|phase| self.hooks_for(step, *phase).len()).sum()
  }
}
