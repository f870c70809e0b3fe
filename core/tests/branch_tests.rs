// tests/branch_tests.rs
mod common;

use adaze_core::{Flow, FlowControl, FlowError, FlowOutcome, FlowState, Handler};
use common::*;
use serial_test::serial;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn refund_flow() -> Arc<Flow<RefundState, TestError>> {
  let mut flow = Flow::<RefundState, TestError>::new(&[("refund", false)]);
  flow.on("refund", |state: FlowState<RefundState>| async move {
    SUB_FLOW_RUNS.fetch_add(1, Ordering::SeqCst);
    let mut guard = state.write();
    guard.refunded = guard.amount_cents > 0;
    Ok::<_, TestError>(FlowControl::Continue)
  });
  Arc::new(flow)
}

fn payout_flow(halt: bool) -> Arc<Flow<PayoutState, TestError>> {
  let mut flow = Flow::<PayoutState, TestError>::new(&[("payout", false)]);
  flow.on("payout", move |state: FlowState<PayoutState>| async move {
    SUB_FLOW_RUNS.fetch_add(1, Ordering::SeqCst);
    state.write().paid = true;
    Ok::<_, TestError>(if halt { FlowControl::Halt } else { FlowControl::Continue })
  });
  Arc::new(flow)
}

fn tail_handler(name: &'static str) -> Handler<ParentState, TestError> {
  Box::new(move |state: FlowState<ParentState>| {
    Box::pin(async move {
      state.write().stages_run.push(name.to_string());
      Ok(FlowControl::Continue)
    })
  })
}

fn routed_flow(payout_halts: bool, optional: bool) -> Flow<ParentState, TestError> {
  let mut flow = Flow::<ParentState, TestError>::new(&[("effects", false), ("tail", false)]);
  flow
    .branches_for_stage("effects")
    .when(
      "refund",
      |s: &ParentState| s.route.as_deref() == Some("refund"),
      refund_flow(),
      |state: &FlowState<ParentState>| Ok(state.read().refund.clone()),
    )
    .when(
      "payout",
      |s: &ParentState| s.route.as_deref() == Some("payout"),
      payout_flow(payout_halts),
      |state: &FlowState<ParentState>| Ok(state.read().payout.clone()),
    )
    .otherwise(FlowControl::Continue)
    .finalize(optional);
  flow.on("tail", tail_handler("tail"));
  flow
}

#[tokio::test]
#[serial]
async fn first_matching_branch_runs_on_extracted_sub_state() {
  setup_tracing();
  reset_counters();
  let flow = routed_flow(false, false);
  assert!(flow.is_branched("effects"));

  let state = FlowState::new(ParentState {
    route: Some("refund".to_string()),
    ..Default::default()
  });
  state.read().refund.write().amount_cents = 1_250;

  let outcome = flow.run(state.clone()).await.expect("flow should complete");

  assert_eq!(outcome, FlowOutcome::Completed);
  let guard = state.read();
  assert!(guard.refund.read().refunded);
  assert!(!guard.payout.read().paid);
  assert_eq!(guard.stages_run, vec!["tail"]);
  assert_eq!(SUB_FLOW_RUNS.load(Ordering::SeqCst), 1);
}

#[tokio::test]
#[serial]
async fn no_match_uses_otherwise_verdict() {
  setup_tracing();
  reset_counters();
  let flow = routed_flow(false, false);

  let state = FlowState::new(ParentState::default());
  let outcome = flow.run(state.clone()).await.expect("flow should complete");

  assert_eq!(outcome, FlowOutcome::Completed);
  assert_eq!(SUB_FLOW_RUNS.load(Ordering::SeqCst), 0);
  assert_eq!(state.read().stages_run, vec!["tail"]);
}

#[tokio::test]
#[serial]
async fn halted_sub_flow_halts_the_parent() {
  setup_tracing();
  reset_counters();
  let flow = routed_flow(true, false);

  let state = FlowState::new(ParentState {
    route: Some("payout".to_string()),
    ..Default::default()
  });
  let outcome = flow.run(state.clone()).await.expect("halting is not an error");

  assert_eq!(outcome, FlowOutcome::Halted);
  let guard = state.read();
  assert!(guard.payout.read().paid);
  assert!(guard.stages_run.is_empty());
}

fn failing_extractor_flow(optional: bool) -> Flow<ParentState, TestError> {
  let mut flow = Flow::<ParentState, TestError>::new(&[("effects", false), ("tail", false)]);
  flow
    .branches_for_stage("effects")
    .when(
      "refund",
      |_: &ParentState| true,
      refund_flow(),
      |_: &FlowState<ParentState>| Err(FlowError::Handler { source: anyhow::anyhow!("ledger unavailable") }),
    )
    .finalize(optional);
  flow.on("tail", tail_handler("tail"));
  flow
}

#[tokio::test]
#[serial]
async fn extractor_failure_names_the_stage() {
  setup_tracing();
  reset_counters();
  let flow = failing_extractor_flow(false);

  let state = FlowState::new(ParentState::default());
  let err = flow.run(state.clone()).await.expect_err("extractor failure should propagate");

  match err {
    TestError::Flow(FlowError::ExtractorFailure { stage, source }) => {
      assert_eq!(stage, "effects");
      assert!(source.to_string().contains("ledger unavailable"));
    }
    other => panic!("unexpected error: {other:?}"),
  }
  assert_eq!(SUB_FLOW_RUNS.load(Ordering::SeqCst), 0);
}

#[tokio::test]
#[serial]
async fn optional_branch_stage_swallows_failures() {
  setup_tracing();
  reset_counters();
  let flow = failing_extractor_flow(true);

  let state = FlowState::new(ParentState::default());
  let outcome = flow.run(state.clone()).await.expect("optional stage should not fail the run");

  assert_eq!(outcome, FlowOutcome::Completed);
  assert_eq!(state.read().stages_run, vec!["tail"]);
}

#[test]
fn branches_for_unknown_stage_appends_it() {
  let mut flow = Flow::<ParentState, TestError>::new(&[("first", false)]);
  flow
    .branches_for_stage("late")
    .when(
      "refund",
      |_: &ParentState| false,
      refund_flow(),
      |state: &FlowState<ParentState>| Ok(state.read().refund.clone()),
    )
    .finalize(false);
  assert_eq!(flow.stage_names(), vec!["first", "late"]);
  assert!(flow.is_branched("late"));
}
