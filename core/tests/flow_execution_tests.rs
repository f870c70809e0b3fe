// tests/flow_execution_tests.rs
mod common;

use adaze_core::{Flow, FlowControl, FlowError, FlowOutcome, FlowState};
use common::*;
use serial_test::serial;
use std::sync::Arc;

#[tokio::test]
#[serial]
async fn stages_run_in_declared_order() {
  setup_tracing();
  let mut flow = Flow::<TestState, TestError>::new(&[("validate", false), ("persist", false), ("notify", false)]);
  flow.on("validate", recording_handler("validate", "V"));
  flow.on("persist", recording_handler("persist", "P"));
  flow.on("notify", recording_handler("notify", "N"));

  let state = FlowState::new(TestState::default());
  let outcome = flow.run(state.clone()).await.expect("flow should complete");

  assert_eq!(outcome, FlowOutcome::Completed);
  let guard = state.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.trail, "VPN");
  assert_eq!(guard.stages_run, vec!["validate", "persist", "notify"]);
}

#[tokio::test]
#[serial]
async fn before_on_after_run_in_phase_order() {
  setup_tracing();
  let mut flow = Flow::<TestState, TestError>::new(&[("only", false)]);
  flow.after("only", recording_handler("after", "c"));
  flow.on("only", recording_handler("on", "b"));
  flow.before("only", recording_handler("before", "a"));

  let state = FlowState::new(TestState::default());
  flow.run(state.clone()).await.expect("flow should complete");

  assert_eq!(state.read().trail, "abc");
}

#[tokio::test]
#[serial]
async fn halt_stops_the_remaining_stages() {
  setup_tracing();
  let mut flow = Flow::<TestState, TestError>::new(&[("first", false), ("stopper", false), ("never", false)]);
  flow.on("first", recording_handler("first", "1"));
  flow.on("stopper", recording_handler("stopper", "2"));
  flow.after("stopper", recording_handler("stopper_after", "x"));
  flow.on("never", recording_handler("never", "3"));

  let state = FlowState::new(TestState {
    halt_at: Some("stopper".to_string()),
    ..Default::default()
  });
  let outcome = flow.run(state.clone()).await.expect("halting is not an error");

  assert_eq!(outcome, FlowOutcome::Halted);
  let guard = state.read();
  assert_eq!(guard.trail, "12");
  assert_eq!(guard.stages_run, vec!["first", "stopper"]);
}

#[tokio::test]
#[serial]
async fn first_handler_error_aborts_the_run() {
  setup_tracing();
  let mut flow = Flow::<TestState, TestError>::new(&[("good", false), ("bad", false), ("after_bad", false)]);
  flow.on("good", recording_handler("good", "G"));
  flow.on("bad", failing_handler("bad", "payment declined"));
  flow.on("after_bad", recording_handler("after_bad", "X"));

  let state = FlowState::new(TestState::default());
  let err = flow.run(state.clone()).await.expect_err("flow should fail");

  assert!(matches!(err, TestError::Handler(ref m) if m == "payment declined"));
  assert_eq!(state.read().stages_run, vec!["good", "bad"]);
}

#[tokio::test]
#[serial]
async fn required_stage_without_handlers_is_an_error() {
  setup_tracing();
  let mut flow = Flow::<TestState, TestError>::new(&[("wired", false), ("forgotten", false)]);
  flow.on("wired", recording_handler("wired", "W"));

  let state = FlowState::new(TestState::default());
  let err = flow.run(state.clone()).await.expect_err("missing handler should fail");

  assert!(matches!(err, TestError::Flow(FlowError::HandlerMissing { ref stage }) if stage == "forgotten"));
  assert_eq!(state.read().counter, 1);
}

#[tokio::test]
#[serial]
async fn optional_stage_without_handlers_is_skipped() {
  setup_tracing();
  let mut flow = Flow::<TestState, TestError>::new(&[("maybe", true), ("always", false)]);
  flow.on("always", recording_handler("always", "A"));

  let state = FlowState::new(TestState::default());
  let outcome = flow.run(state.clone()).await.expect("flow should complete");

  assert_eq!(outcome, FlowOutcome::Completed);
  assert_eq!(state.read().stages_run, vec!["always"]);
}

#[tokio::test]
#[serial]
async fn skip_condition_is_checked_against_current_state() {
  setup_tracing();
  let mut flow = Flow::<TestState, TestError>::new(&[("decide", false), ("audit", false), ("finish", false)]);
  flow.on("decide", |state: FlowState<TestState>| async move {
    state.write().skip_audit = true;
    Ok::<_, TestError>(FlowControl::Continue)
  });
  flow.on("audit", recording_handler("audit", "A"));
  flow.on("finish", recording_handler("finish", "F"));
  flow.set_skip_condition("audit", Some(Arc::new(|s: &TestState| s.skip_audit)));

  let state = FlowState::new(TestState::default());
  flow.run(state.clone()).await.expect("flow should complete");

  assert_eq!(state.read().stages_run, vec!["finish"]);
}

#[tokio::test]
#[serial]
async fn handler_errors_convert_through_into() {
  setup_tracing();
  let mut flow = Flow::<TestState, TestError>::new(&[("engine_error", false)]);
  flow.on("engine_error", |_state: FlowState<TestState>| async move {
    Err::<FlowControl, FlowError>(FlowError::Internal("boom".to_string()))
  });

  let err = flow.run(FlowState::new(TestState::default())).await.expect_err("should fail");
  assert!(matches!(err, TestError::Flow(FlowError::Internal(ref m)) if m == "boom"));
}

#[test]
fn stage_list_can_be_reshaped() {
  let mut flow = Flow::<TestState, TestError>::new(&[("a", false), ("c", false)]);
  flow.insert_after("a", "b", false);
  flow.insert_before("a", "start", true);
  flow.insert_after("c", "end", false);
  assert_eq!(flow.stage_names(), vec!["start", "a", "b", "c", "end"]);

  flow.on("b", recording_handler("b", "B"));
  flow.remove_stage("b");
  assert!(!flow.has_stage("b"));
  assert_eq!(flow.stage_names(), vec!["start", "a", "c", "end"]);

  flow.remove_stage("does_not_exist");
  assert_eq!(flow.stage_names().len(), 4);
}

#[test]
#[should_panic(expected = "already defined")]
fn inserting_a_duplicate_stage_panics() {
  let mut flow = Flow::<TestState, TestError>::new(&[("a", false), ("b", false)]);
  flow.insert_after("a", "b", false);
}

#[test]
#[should_panic(expected = "is not defined")]
fn attaching_to_an_unknown_stage_panics() {
  let mut flow = Flow::<TestState, TestError>::new(&[("a", false)]);
  flow.on("missing", recording_handler("missing", "M"));
}

#[test]
fn flow_state_clones_share_data() {
  let state = FlowState::new(TestState::default());
  let other = state.clone();
  other.write().counter = 7;

  assert!(state.same_as(&other));
  assert_eq!(state.read().counter, 7);
  assert_eq!(*state.map_read(|s| &s.counter), 7);

  *state.map_write(|s| &mut s.trail) = "mapped".to_string();
  assert_eq!(other.read().trail, "mapped");

  let guard = state.write();
  assert!(other.try_read().is_none());
  drop(guard);
  assert!(other.try_write().is_some());
}
