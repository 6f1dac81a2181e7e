// stepwise/src/core/hook.rs

//! The boxed hook type stored by a flow.

use crate::core::control::Control;
use crate::core::shared::Shared;
use std::future::Future;
use std::pin::Pin;

/// Future returned by a stored hook.
pub type HookFuture<E> = Pin<Box<dyn Future<Output = Result<Control, E>> + Send>>;

/// A stored hook. It receives its own handle to the run's context.
///
/// Hooks take a lock, copy out what they need and release the lock before
/// awaiting anything.
pub type Hook<T, E> = Box<dyn Fn(Shared<T>) -> HookFuture<E> + Send + Sync>;

/// The three phases a step runs, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
  Before,
  On,
  After,
}

impl Phase {
  pub const ORDER: [Phase; 3] = [Phase::Before, Phase::On, Phase::After];

  pub fn label(&self) -> &'static str {
    match self {
      Phase::Before => "before",
      Phase::On => "on",
      Phase::After => "after",
    }
  }
}
