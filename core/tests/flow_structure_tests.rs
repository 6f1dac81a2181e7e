// tests/flow_structure_tests.rs
mod common;

use common::*;
use std::sync::Arc;
use stepwise::{Flow, FlowError, Outcome, Shared, StepSpec};

fn base_flow() -> Flow<Ledger, TestError> {
  let mut flow = Flow::new("structure").step("a").step("c");
  flow.on("a", recording_hook("a", 1));
  flow.on("c", recording_hook("c", 1));
  flow
}

#[test]
fn insert_before_and_after_place_steps() {
  let mut flow = base_flow();
  flow.insert_after("a", StepSpec::required("b")).unwrap();
  flow.insert_before("a", StepSpec::optional("pre")).unwrap();
  assert_eq!(flow.step_names(), vec!["pre", "a", "b", "c"]);
}

#[test]
fn insert_next_to_unknown_step_fails() {
  let mut flow = base_flow();
  let err = flow.insert_after("missing", StepSpec::required("b")).unwrap_err();
  assert!(matches!(err, FlowError::UnknownStep { ref step, .. } if step == "missing"));
}

#[test]
fn duplicate_insert_is_rejected() {
  let mut flow = base_flow();
  let err = flow.insert_before("c", StepSpec::required("a")).unwrap_err();
  assert!(matches!(err, FlowError::DuplicateStep { ref step, .. } if step == "a"));
}

#[test]
#[should_panic(expected = "declared twice")]
fn duplicate_declaration_panics() {
  let _ = Flow::<Ledger, TestError>::new("dup").step("x").optional_step("x");
}

#[test]
#[should_panic(expected = "is not declared")]
fn hook_on_undeclared_step_panics() {
  let mut flow = Flow::<Ledger, TestError>::new("typo").step("charge");
  flow.on("chrage", recording_hook("charge", 1));
}

#[tokio::test]
async fn removed_step_drops_its_hooks() {
  setup_tracing();
  let mut flow = base_flow();
  flow.remove_step("c").unwrap();
  assert_eq!(flow.step_names(), vec!["a"]);

  let ctx = Shared::new(Ledger::default());
  flow.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().trail, vec!["a"]);
}

#[tokio::test]
async fn set_optional_and_skip_predicate_apply_to_existing_steps() {
  setup_tracing();
  let mut flow = base_flow().step("bare");
  assert!(flow.run(Shared::new(Ledger::default())).await.is_err());

  flow.set_optional("bare", true).unwrap();
  flow
    .set_skip_predicate("a", Some(Arc::new(|_ctx: &Shared<Ledger>| true)))
    .unwrap();

  let ctx = Shared::new(Ledger::default());
  assert_eq!(flow.run(ctx.clone()).await, Ok(Outcome::Completed));
  assert_eq!(ctx.read().trail, vec!["c"]);
}

#[test]
fn shared_handles_observe_each_other() {
  let ctx = Shared::new(Ledger::default());
  let other = ctx.clone();
  assert_eq!(ctx.handle_count(), 2);

  other.write().total = 9;
  assert_eq!(*ctx.project(|l| &l.total), 9);

  let snap = ctx.snapshot();
  other.write().total = 10;
  assert_eq!(snap.total, 9);
  assert_eq!(ctx.read().total, 10);

  let held = ctx.write();
  assert!(other.try_read().is_none());
  drop(held);
  assert!(other.try_write().is_some());
}
