// marketplace/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use adaze_core::order::{authorize_claim, authorize_transition, can_view};
use adaze_core::{FlowState, OrderStatus, Role};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::events::{MarketEvent, MarketEventKind};
use crate::models::{OrderFilter, OrderWithItems};
use crate::pipelines::contexts::OrderStatusState;
use crate::state::AppState;
use crate::web::handlers::run_flow;
use crate::web::AuthenticatedUser;

/// Which side of the order the caller is looking from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderView {
  Buying,
  Selling,
  Delivering,
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
  pub status: Option<OrderStatus>,
  pub view: Option<OrderView>,
}

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
  pub status: OrderStatus,
}

fn default_view(role: Role) -> Option<OrderView> {
  match role {
    Role::Buyer => Some(OrderView::Buying),
    Role::Trader | Role::Wholesaler => Some(OrderView::Selling),
    Role::Transporter => Some(OrderView::Delivering),
    Role::Admin => None,
  }
}

/// Orders scoped to the caller. Admins without a view see everything.
#[instrument(name = "handler::list_orders", skip(app_state, user), fields(user_id = %user.actor.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  query: web::Query<OrderListQuery>,
) -> Result<HttpResponse> {
  let actor = user.actor;
  let view = query.view.or_else(|| default_view(actor.role));
  let mut filter = OrderFilter {
    status: query.status,
    ..OrderFilter::default()
  };
  match view {
    Some(OrderView::Buying) if actor.role.buys() || actor.is_admin() => filter.buyer_id = Some(actor.user_id),
    Some(OrderView::Selling) if actor.role.sells() || actor.is_admin() => filter.trader_id = Some(actor.user_id),
    Some(OrderView::Delivering) if actor.role == Role::Transporter || actor.is_admin() => {
      filter.transporter_id = Some(actor.user_id)
    }
    None if actor.is_admin() => {}
    Some(v) => {
      return Err(AppError::Forbidden(format!(
        "A {} account cannot list orders as {:?}.",
        actor.role, v
      )))
    }
    None => return Err(AppError::Forbidden("No order view for this account.".to_string())),
  }
  let orders = app_state.store.list_orders(&filter).await?;
  Ok(HttpResponse::Ok().json(orders))
}

/// Confirmed orders waiting for a transporter.
#[instrument(name = "handler::available_orders", skip_all, fields(user_id = %user.actor.user_id))]
pub async fn available_orders_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
) -> Result<HttpResponse> {
  if user.actor.role != Role::Transporter && !user.actor.is_admin() {
    return Err(AppError::Forbidden("Only transporters can browse deliveries.".to_string()));
  }
  let filter = OrderFilter {
    status: Some(OrderStatus::Confirmed),
    unassigned: true,
    ..OrderFilter::default()
  };
  let orders = app_state.store.list_orders(&filter).await?;
  Ok(HttpResponse::Ok().json(orders))
}

async fn visible_order(app_state: &AppState, user: &AuthenticatedUser, order_id: Uuid) -> Result<OrderWithItems> {
  app_state
    .store
    .order(order_id)
    .await?
    .filter(|o| can_view(&user.actor, &o.order.parties()))
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))
}

#[instrument(name = "handler::get_order", skip(app_state, user), fields(user_id = %user.actor.user_id))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let order = visible_order(&app_state, &user, path.into_inner()).await?;
  let parties = order.order.parties();
  let next: Vec<OrderStatus> = order
    .order
    .status
    .allowed_targets()
    .into_iter()
    .filter(|to| authorize_transition(order.order.status, *to, &user.actor, &parties).is_ok())
    .collect();
  Ok(HttpResponse::Ok().json(json!({ "order": order, "next_statuses": next })))
}

#[instrument(name = "handler::change_order_status", skip(app_state, user), fields(user_id = %user.actor.user_id))]
pub async fn change_status_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<StatusPayload>,
) -> Result<HttpResponse> {
  let state = FlowState::new(OrderStatusState::new(
    app_state.get_ref().clone(),
    user.actor,
    path.into_inner(),
    payload.status,
  ));
  run_flow(&app_state, state.clone(), "Order status change").await?;

  let guard = state.read();
  let order = guard
    .updated
    .clone()
    .ok_or_else(|| AppError::Internal("Status change completed without an updated order.".to_string()))?;
  let restocked = guard.effects.restock.then(|| guard.restock.read().clone());
  let settlement = guard.effects.settle.then(|| guard.settlement.read().clone());
  Ok(HttpResponse::Ok().json(json!({
    "order": order,
    "restocked": restocked,
    "settlement": settlement,
  })))
}

#[instrument(name = "handler::claim_order", skip(app_state, user), fields(user_id = %user.actor.user_id))]
pub async fn claim_order_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let order_id = path.into_inner();
  let current = app_state
    .store
    .order(order_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;
  authorize_claim(current.order.status, &user.actor, &current.order.parties())?;

  let claimed = app_state.store.claim_order(order_id, user.actor.user_id).await?;
  info!(%order_id, transporter_id = %user.actor.user_id, "Delivery claimed.");
  app_state.events.publish(MarketEvent::new(
    MarketEventKind::OrderClaimed {
      order_id,
      transporter_id: user.actor.user_id,
    },
    [claimed.buyer_id, claimed.trader_id, user.actor.user_id],
  ));
  Ok(HttpResponse::Ok().json(claimed))
}
