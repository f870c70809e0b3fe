// marketplace/src/pipelines/checkout.rs

//! Cart to orders: one order per seller, written in a single store unit.

use crate::errors::AppError;
use crate::events::{MarketEvent, MarketEventKind};
use crate::pipelines::contexts::CheckoutState;
use adaze_core::checkout::plan_checkout;
use adaze_core::{Flow, FlowControl, FlowState};
use tracing::{info, instrument, warn};

pub fn build_checkout_flow() -> Flow<CheckoutState, AppError> {
  let mut flow = Flow::new(&[
    ("check_buyer", false),
    ("load_cart", false),
    ("plan_orders", false),
    ("place_orders", false),
    ("notify_parties", true),
  ]);
  flow.on("check_buyer", check_buyer);
  flow.on("load_cart", load_cart);
  flow.on("plan_orders", plan_orders);
  flow.on("place_orders", place_orders);
  flow.on("notify_parties", notify_parties);
  flow
}

#[instrument(name = "checkout::check_buyer", skip_all)]
async fn check_buyer(state: FlowState<CheckoutState>) -> Result<FlowControl, AppError> {
  let guard = state.read();
  if guard.settings.maintenance_mode && !guard.actor.is_admin() {
    warn!(user_id = %guard.actor.user_id, "Checkout blocked by maintenance mode.");
    return Err(AppError::Forbidden(
      "The marketplace is in maintenance mode. Checkout is paused.".to_string(),
    ));
  }
  if !guard.actor.role.buys() {
    return Err(AppError::Forbidden(format!("A {} account cannot place orders.", guard.actor.role)));
  }
  Ok(FlowControl::Continue)
}

#[instrument(name = "checkout::load_cart", skip_all)]
async fn load_cart(state: FlowState<CheckoutState>) -> Result<FlowControl, AppError> {
  let (store, user_id) = {
    let guard = state.read();
    (guard.app.store.clone(), guard.actor.user_id)
  };
  let lines = store.cart_lines(user_id).await?;
  state.write().lines = lines;
  Ok(FlowControl::Continue)
}

#[instrument(name = "checkout::plan_orders", skip_all)]
async fn plan_orders(state: FlowState<CheckoutState>) -> Result<FlowControl, AppError> {
  let mut guard = state.write();
  let plan = plan_checkout(guard.actor.user_id, &guard.lines, &guard.settings)?;
  info!(
    orders = plan.orders.len(),
    items = plan.item_count(),
    grand_total_cents = plan.grand_total_cents,
    "Checkout planned."
  );
  guard.plan = Some(plan);
  Ok(FlowControl::Continue)
}

#[instrument(name = "checkout::place_orders", skip_all)]
async fn place_orders(state: FlowState<CheckoutState>) -> Result<FlowControl, AppError> {
  let (store, plan, address) = {
    let guard = state.read();
    let plan = guard
      .plan
      .clone()
      .ok_or_else(|| AppError::Internal("Checkout plan missing before placement.".to_string()))?;
    (guard.app.store.clone(), plan, guard.shipping_address.clone())
  };
  let placed = store.place_orders(&plan, address).await?;
  info!(buyer_id = %plan.buyer_id, orders = placed.len(), "Orders placed.");
  state.write().placed = placed;
  Ok(FlowControl::Continue)
}

#[instrument(name = "checkout::notify_parties", skip_all)]
async fn notify_parties(state: FlowState<CheckoutState>) -> Result<FlowControl, AppError> {
  let guard = state.read();
  for placed in &guard.placed {
    let order = &placed.order;
    guard.app.events.publish(MarketEvent::new(
      MarketEventKind::OrderPlaced {
        order_id: order.id,
        total_cents: order.total_cents,
      },
      [order.buyer_id, order.trader_id],
    ));
  }
  Ok(FlowControl::Continue)
}
