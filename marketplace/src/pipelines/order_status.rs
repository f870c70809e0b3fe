// marketplace/src/pipelines/order_status.rs

//! Moves an order along the status machine, then runs the follow-up work the
//! transition implies: a cancel hands stock back, a delivery settles earnings.

use crate::errors::AppError;
use crate::events::{MarketEvent, MarketEventKind};
use crate::pipelines::contexts::{OrderStatusState, RestockState, SettlementState};
use adaze_core::order::{authorize_transition, can_view};
use adaze_core::{Flow, FlowControl, FlowError, FlowState};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub fn build_order_status_flow() -> Flow<OrderStatusState, AppError> {
  let mut flow = Flow::new(&[
    ("load_order", false),
    ("authorize", false),
    ("apply_transition", false),
    ("effects", true),
    ("notify_parties", true),
  ]);
  flow.on("load_order", load_order);
  flow.on("authorize", authorize);
  flow.on("apply_transition", apply_transition);
  flow.set_skip_condition(
    "effects",
    Some(Arc::new(|s: &OrderStatusState| !s.effects.restock && !s.effects.settle)),
  );

  let restock_flow = Arc::new(build_restock_flow());
  let settlement_flow = Arc::new(build_settlement_flow());
  flow
    .branches_for_stage("effects")
    .when("restock", |s: &OrderStatusState| s.effects.restock, restock_flow, extract_restock)
    .when("settle", |s: &OrderStatusState| s.effects.settle, settlement_flow, extract_settlement)
    .otherwise(FlowControl::Continue)
    .finalize(true);

  flow.on("notify_parties", notify_parties);
  flow
}

fn extract_restock(state: &FlowState<OrderStatusState>) -> Result<FlowState<RestockState>, FlowError> {
  let guard = state.read();
  let current = guard
    .current
    .as_ref()
    .ok_or_else(|| FlowError::Internal("order not loaded before restock".to_string()))?;
  {
    let mut restock = guard.restock.write();
    restock.order_id = current.order.id;
    restock.items = current.items.clone();
  }
  Ok(guard.restock.clone())
}

fn extract_settlement(state: &FlowState<OrderStatusState>) -> Result<FlowState<SettlementState>, FlowError> {
  let guard = state.read();
  let order = guard
    .updated
    .as_ref()
    .ok_or_else(|| FlowError::Internal("order not updated before settlement".to_string()))?;
  {
    let mut settlement = guard.settlement.write();
    settlement.order_id = order.id;
    settlement.subtotal_cents = order.subtotal_cents;
    settlement.shipping_fee_cents = order.shipping_fee_cents;
    settlement.commission_cents = order.commission_cents;
    settlement.transporter_fee_cents = order.transporter_fee_cents;
    settlement.transporter_id = order.transporter_id;
  }
  Ok(guard.settlement.clone())
}

#[instrument(name = "order_status::load_order", skip_all)]
async fn load_order(state: FlowState<OrderStatusState>) -> Result<FlowControl, AppError> {
  let (store, order_id) = {
    let guard = state.read();
    (guard.app.store.clone(), guard.order_id)
  };
  let order = store
    .order(order_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;
  state.write().current = Some(order);
  Ok(FlowControl::Continue)
}

#[instrument(name = "order_status::authorize", skip_all)]
async fn authorize(state: FlowState<OrderStatusState>) -> Result<FlowControl, AppError> {
  let mut guard = state.write();
  let (from, parties) = match guard.current.as_ref() {
    Some(current) => (current.order.status, current.order.parties()),
    None => return Err(AppError::Internal("Order not loaded before authorization.".to_string())),
  };
  if !can_view(&guard.actor, &parties) {
    return Err(AppError::NotFound(format!("Order {} not found", guard.order_id)));
  }
  let effects = authorize_transition(from, guard.target, &guard.actor, &parties)?;
  debug!(%from, to = %guard.target, ?effects, "Transition authorized.");
  guard.effects = effects;
  Ok(FlowControl::Continue)
}

#[instrument(name = "order_status::apply_transition", skip_all)]
async fn apply_transition(state: FlowState<OrderStatusState>) -> Result<FlowControl, AppError> {
  let (store, order_id, from, to, restock) = {
    let guard = state.read();
    let from = guard
      .current
      .as_ref()
      .map(|c| c.order.status)
      .ok_or_else(|| AppError::Internal("Order not loaded before transition.".to_string()))?;
    (guard.app.store.clone(), guard.order_id, from, guard.target, guard.effects.restock)
  };
  let updated = store.transition_order(order_id, from, to, restock).await?;
  info!(%order_id, %from, %to, "Order status changed.");
  state.write().updated = Some(updated);
  Ok(FlowControl::Continue)
}

#[instrument(name = "order_status::notify_parties", skip_all)]
async fn notify_parties(state: FlowState<OrderStatusState>) -> Result<FlowControl, AppError> {
  let guard = state.read();
  if let (Some(before), Some(after)) = (&guard.current, &guard.updated) {
    let parties = after.parties();
    guard.app.events.publish(MarketEvent::new(
      MarketEventKind::OrderStatusChanged {
        order_id: after.id,
        from: before.order.status,
        to: after.status,
      },
      [parties.buyer_id, parties.trader_id].into_iter().chain(parties.transporter_id),
    ));
  }
  Ok(FlowControl::Continue)
}

// --- restock sub-flow ---

pub fn build_restock_flow() -> Flow<RestockState, AppError> {
  let mut flow = Flow::new(&[("tally_units", false), ("report", true)]);
  flow.on("tally_units", tally_units);
  flow.on("report", |state: FlowState<RestockState>| async move {
    let guard = state.read();
    info!(
      order_id = %guard.order_id,
      products = guard.products,
      units = guard.units_returned,
      "Stock returned for cancelled order."
    );
    Ok::<_, AppError>(FlowControl::Continue)
  });
  flow
}

async fn tally_units(state: FlowState<RestockState>) -> Result<FlowControl, AppError> {
  let mut guard = state.write();
  let products: HashSet<_> = guard.items.iter().map(|i| i.product_id).collect();
  guard.products = products.len();
  guard.units_returned = guard.items.iter().map(|i| i64::from(i.quantity)).sum();
  Ok(FlowControl::Continue)
}

// --- settlement sub-flow ---

pub fn build_settlement_flow() -> Flow<SettlementState, AppError> {
  let mut flow = Flow::new(&[("compute_split", false), ("report", true)]);
  flow.on("compute_split", compute_split);
  flow.on("report", |state: FlowState<SettlementState>| async move {
    let guard = state.read();
    info!(
      order_id = %guard.order_id,
      trader_cents = guard.trader_earnings_cents,
      transporter_cents = guard.transporter_earnings_cents,
      platform_cents = guard.platform_earnings_cents,
      "Order settled."
    );
    Ok::<_, AppError>(FlowControl::Continue)
  });
  flow
}

/// The three shares always add up to subtotal plus shipping. An unassigned
/// transporter share stays with the platform.
async fn compute_split(state: FlowState<SettlementState>) -> Result<FlowControl, AppError> {
  let mut guard = state.write();
  let trader = guard.subtotal_cents - guard.commission_cents - guard.transporter_fee_cents;
  if trader < 0 {
    return Err(AppError::Internal(format!(
      "Commissions exceed the subtotal of order {}",
      guard.order_id
    )));
  }
  let transporter = if guard.transporter_id.is_some() {
    guard.transporter_fee_cents
  } else {
    0
  };
  guard.trader_earnings_cents = trader;
  guard.transporter_earnings_cents = transporter;
  guard.platform_earnings_cents =
    guard.commission_cents + guard.shipping_fee_cents + (guard.transporter_fee_cents - transporter);
  Ok(FlowControl::Continue)
}
