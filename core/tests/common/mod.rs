// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use std::future::Future;
use std::pin::Pin;
use stepwise::{Control, FlowError, Shared};
use tracing::Level;

#[derive(Clone, Debug, Default)]
pub struct Ledger {
  pub total: i64,
  pub trail: Vec<String>,
  pub halt_at: Option<String>,
  pub fail_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  // FlowError is not PartialEq, keep its Debug rendering instead.
  #[error("flow error: {0}")]
  Flow(String),

  #[error("hook failed: {0}")]
  Hook(String),
}

impl From<FlowError> for TestError {
  fn from(e: FlowError) -> Self {
    TestError::Flow(format!("{:?}", e))
  }
}

pub type BoxedHookFuture = Pin<Box<dyn Future<Output = Result<Control, TestError>> + Send>>;

/// Hook that records `label` in the trail and adds `amount` to the total.
/// Halts when `halt_at` names this label, fails when `fail_at` does.
pub fn recording_hook(label: &'static str, amount: i64) -> impl Fn(Shared<Ledger>) -> BoxedHookFuture + Send + Sync {
  move |ctx: Shared<Ledger>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.trail.push(label.to_string());
      if guard.fail_at.as_deref() == Some(label) {
        return Err(TestError::Hook(format!("{} failed", label)));
      }
      guard.total += amount;
      if guard.halt_at.as_deref() == Some(label) {
        return Ok(Control::Halt);
      }
      Ok(Control::Proceed)
    })
  }
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
