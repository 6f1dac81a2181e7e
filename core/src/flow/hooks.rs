// stepwise/src/flow/hooks.rs

//! Registration of `before`, `on` and `after` hooks.

use crate::core::control::Control;
use crate::core::hook::{Hook, Phase};
use crate::core::Shared;
use crate::error::FlowError;
use crate::flow::definition::Flow;
use std::future::Future;
use tracing::{event, Level};

impl<T, E> Flow<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Registers a hook that runs before the step's `on` hooks.
  ///
  /// The hook may fail with any error convertible into the flow's `E`.
  /// Panics if `step` is not declared; hooks are wired once at startup and a
  /// typo there is a programming error.
  pub fn before<F, Fut, HookErr>(&mut self, step: &str, hook: F) -> &mut Self
  where
    F: Fn(Shared<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Control, HookErr>> + Send + 'static,
    HookErr: Into<E> + Send + 'static,
  {
    self.add_hook(step, Phase::Before, hook)
  }

  /// Registers the main body of a step.
  pub fn on<F, Fut, HookErr>(&mut self, step: &str, hook: F) -> &mut Self
  where
    F: Fn(Shared<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Control, HookErr>> + Send + 'static,
    HookErr: Into<E> + Send + 'static,
  {
    self.add_hook(step, Phase::On, hook)
  }

  /// Registers a hook that inspects what the step's `on` hooks produced.
  pub fn after<F, Fut, HookErr>(&mut self, step: &str, hook: F) -> &mut Self
  where
    F: Fn(Shared<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Control, HookErr>> + Send + 'static,
    HookErr: Into<E> + Send + 'static,
  {
    self.add_hook(step, Phase::After, hook)
  }

  fn add_hook<F, Fut, HookErr>(&mut self, step: &str, phase: Phase, hook: F) -> &mut Self
  where
    F: Fn(Shared<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Control, HookErr>> + Send + 'static,
    HookErr: Into<E> + Send + 'static,
  {
    if !self.has_step(step) {
      panic!(
        "stepwise setup error: cannot attach {} hook, step '{}' is not declared in flow '{}'",
        phase.label(),
        step,
        self.name
      );
    }

    let boxed: Hook<T, E> = Box::new(move |ctx| {
      let fut = hook(ctx);
      Box::pin(async move { fut.await.map_err(Into::into) })
    });
    self.hooks.entry((step.to_string(), phase)).or_default().push(boxed);
    event!(Level::TRACE, flow = %self.name, %step, phase = phase.label(), "Hook attached.");
    self
  }
}
