// tests/common/mod.rs
#![allow(dead_code)]

use adaze_core::analytics::{FactLine, OrderFact};
use adaze_core::{FlowControl, FlowError, FlowState, Handler, OrderStatus};
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct TestState {
  pub counter: i32,
  pub trail: String,
  pub stages_run: Vec<String>,
  pub halt_at: Option<String>,
  pub skip_audit: bool,
}

/// State with a shared sub-state so branch results are visible after the run.
#[derive(Debug, Default)]
pub struct ParentState {
  pub route: Option<String>,
  pub stages_run: Vec<String>,
  pub refund: FlowState<RefundState>,
  pub payout: FlowState<PayoutState>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RefundState {
  pub amount_cents: i64,
  pub refunded: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PayoutState {
  pub paid: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum TestError {
  #[error("Flow error: {0}")]
  Flow(#[from] FlowError),

  #[error("Test handler failed: {0}")]
  Handler(String),
}

pub fn recording_handler(stage: &'static str, append: &'static str) -> Handler<TestState, TestError> {
  Box::new(move |state: FlowState<TestState>| {
    Box::pin(async move {
      let mut guard = state.write();
      guard.counter += 1;
      guard.trail.push_str(append);
      guard.stages_run.push(stage.to_string());
      tracing::debug!(target: "test_handlers", stage, counter = guard.counter, "handler ran");
      if guard.halt_at.as_deref() == Some(stage) {
        return Ok(FlowControl::Halt);
      }
      Ok(FlowControl::Continue)
    })
  })
}

pub fn failing_handler(stage: &'static str, message: &'static str) -> Handler<TestState, TestError> {
  Box::new(move |state: FlowState<TestState>| {
    Box::pin(async move {
      state.write().stages_run.push(stage.to_string());
      Err(TestError::Handler(message.to_string()))
    })
  })
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

pub static SUB_FLOW_RUNS: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));

pub fn reset_counters() {
  SUB_FLOW_RUNS.store(0, Ordering::SeqCst);
}

// --- Fixtures for rule and analytics tests ---

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).single().expect("valid fixture time")
}

pub fn fact(status: OrderStatus, buyer: Uuid, trader: Uuid, total_cents: i64) -> OrderFact {
  OrderFact {
    order_id: Uuid::new_v4(),
    status,
    buyer_id: buyer,
    trader_id: trader,
    transporter_id: None,
    subtotal_cents: total_cents,
    total_cents,
    commission_cents: total_cents / 10,
    transporter_fee_cents: total_cents / 20,
    created_at: at(1, 9),
    delivered_at: None,
    lines: Vec::new(),
  }
}

pub fn line(product_id: Uuid, name: &str, quantity: i32, revenue_cents: i64) -> FactLine {
  FactLine {
    product_id,
    product_name: name.to_string(),
    quantity,
    revenue_cents,
  }
}
