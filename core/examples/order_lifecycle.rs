// core/examples/order_lifecycle.rs

//! Drives an order through the status machine with a flow whose `effects`
//! stage branches into restock or payout sub-flows.
//!
//! Run with `cargo run -p adaze-core --example order_lifecycle`.

use adaze_core::order::authorize_transition;
use adaze_core::{Actor, Flow, FlowControl, FlowError, FlowState, OrderParties, OrderStatus, Role, TransitionEffects};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Default, Clone)]
struct Restock {
  units: i64,
}

#[derive(Debug, Default, Clone)]
struct Payout {
  trader_cents: i64,
}

#[derive(Debug)]
struct StatusChange {
  actor: Actor,
  parties: OrderParties,
  status: OrderStatus,
  target: OrderStatus,
  units: i64,
  subtotal_cents: i64,
  commission_cents: i64,
  effects: TransitionEffects,
  restock: FlowState<Restock>,
  payout: FlowState<Payout>,
}

fn restock_flow() -> Arc<Flow<Restock, FlowError>> {
  let mut flow = Flow::new(&[("return_units", false)]);
  flow.on("return_units", |state: FlowState<Restock>| async move {
    info!(units = state.read().units, "Units returned to stock.");
    Ok::<_, FlowError>(FlowControl::Continue)
  });
  Arc::new(flow)
}

fn payout_flow() -> Arc<Flow<Payout, FlowError>> {
  let mut flow = Flow::new(&[("release", false)]);
  flow.on("release", |state: FlowState<Payout>| async move {
    info!(trader_cents = state.read().trader_cents, "Trader earnings released.");
    Ok::<_, FlowError>(FlowControl::Continue)
  });
  Arc::new(flow)
}

fn status_flow() -> Flow<StatusChange, FlowError> {
  let mut flow = Flow::new(&[("authorize", false), ("apply", false), ("effects", true)]);

  flow.on("authorize", |state: FlowState<StatusChange>| async move {
    let mut guard = state.write();
    match authorize_transition(guard.status, guard.target, &guard.actor, &guard.parties) {
      Ok(effects) => {
        guard.effects = effects;
        Ok(FlowControl::Continue)
      }
      Err(err) => {
        info!(error = %err, "Transition refused.");
        Ok::<_, FlowError>(FlowControl::Halt)
      }
    }
  });

  flow.on("apply", |state: FlowState<StatusChange>| async move {
    let mut guard = state.write();
    info!(from = %guard.status, to = %guard.target, "Status applied.");
    guard.status = guard.target;
    Ok::<_, FlowError>(FlowControl::Continue)
  });

  flow.set_skip_condition(
    "effects",
    Some(Arc::new(|s: &StatusChange| !s.effects.restock && !s.effects.settle)),
  );
  flow
    .branches_for_stage("effects")
    .when(
      "restock",
      |s: &StatusChange| s.effects.restock,
      restock_flow(),
      |state: &FlowState<StatusChange>| {
        let guard = state.read();
        guard.restock.write().units = guard.units;
        Ok(guard.restock.clone())
      },
    )
    .when(
      "payout",
      |s: &StatusChange| s.effects.settle,
      payout_flow(),
      |state: &FlowState<StatusChange>| {
        let guard = state.read();
        guard.payout.write().trader_cents = guard.subtotal_cents - guard.commission_cents;
        Ok(guard.payout.clone())
      },
    )
    .finalize(true);
  flow
}

#[tokio::main]
async fn main() -> Result<(), FlowError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  let buyer = Actor::new(Uuid::new_v4(), Role::Buyer);
  let trader = Actor::new(Uuid::new_v4(), Role::Trader);
  let transporter = Actor::new(Uuid::new_v4(), Role::Transporter);
  let parties = OrderParties {
    buyer_id: buyer.user_id,
    trader_id: trader.user_id,
    transporter_id: Some(transporter.user_id),
  };
  let flow = status_flow();

  let steps = [
    (trader, OrderStatus::Confirmed),
    (buyer, OrderStatus::Shipped),
    (transporter, OrderStatus::Shipped),
    (transporter, OrderStatus::Delivered),
  ];
  let mut status = OrderStatus::Pending;
  for (actor, target) in steps {
    let state = FlowState::new(StatusChange {
      actor,
      parties,
      status,
      target,
      units: 3,
      subtotal_cents: 13_500,
      commission_cents: 1_350,
      effects: TransitionEffects::default(),
      restock: FlowState::default(),
      payout: FlowState::default(),
    });
    let outcome = flow.run(state.clone()).await?;
    status = state.read().status;
    info!(role = %actor.role, ?outcome, %status, "Step finished.");
  }

  // A second order, cancelled by its buyer before confirmation.
  let state = FlowState::new(StatusChange {
    actor: buyer,
    parties,
    status: OrderStatus::Pending,
    target: OrderStatus::Cancelled,
    units: 2,
    subtotal_cents: 9_000,
    commission_cents: 900,
    effects: TransitionEffects::default(),
    restock: FlowState::default(),
    payout: FlowState::default(),
  });
  flow.run(state.clone()).await?;
  info!(units = state.read().restock.read().units, "Cancelled order restocked.");
  Ok(())
}
