// marketplace/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use adaze_core::FlowState;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::{AppError, Result};
use crate::pipelines::contexts::CheckoutState;
use crate::state::AppState;
use crate::web::handlers::run_flow;
use crate::web::AuthenticatedUser;

#[derive(Deserialize, Debug, Default)]
pub struct CheckoutPayload {
  pub shipping_address: Option<String>,
}

#[instrument(name = "handler::checkout", skip(app_state, user), fields(user_id = %user.actor.user_id))]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  payload: Option<web::Json<CheckoutPayload>>,
) -> Result<HttpResponse> {
  let shipping_address = payload
    .and_then(|p| p.into_inner().shipping_address)
    .map(|a| a.trim().to_string())
    .filter(|a| !a.is_empty());
  let settings = app_state.store.settings().await?;
  let state = FlowState::new(CheckoutState {
    app: app_state.get_ref().clone(),
    actor: user.actor,
    shipping_address,
    settings,
    lines: Vec::new(),
    plan: None,
    placed: Vec::new(),
  });
  run_flow(&app_state, state.clone(), "Checkout").await?;

  let mut guard = state.write();
  let placed = std::mem::take(&mut guard.placed);
  let grand_total_cents = guard
    .plan
    .as_ref()
    .map(|p| p.grand_total_cents)
    .ok_or_else(|| AppError::Internal("Checkout completed without a plan.".to_string()))?;
  info!(orders = placed.len(), grand_total_cents, "Checkout complete.");
  Ok(HttpResponse::Created().json(json!({
    "orders": placed,
    "grand_total_cents": grand_total_cents,
  })))
}
