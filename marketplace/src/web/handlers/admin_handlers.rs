// marketplace/src/web/handlers/admin_handlers.rs

use actix_web::{web, HttpResponse};
use adaze_core::analytics::{daily_revenue, revenue_summary, status_counts, top_products};
use adaze_core::PlatformSettings;
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::events::{MarketEvent, MarketEventKind};
use crate::models::{OrderFilter, ProfileAdminUpdate};
use crate::state::AppState;
use crate::web::AuthenticatedUser;

const DEFAULT_ANALYTICS_DAYS: i64 = 30;
const MAX_ANALYTICS_DAYS: i64 = 366;
const TOP_PRODUCTS: usize = 10;

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
  pub from: Option<NaiveDate>,
  pub to: Option<NaiveDate>,
}

#[instrument(name = "handler::admin_users", skip_all)]
pub async fn list_users_handler(app_state: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse> {
  user.require_admin()?;
  let profiles = app_state.store.list_profiles().await?;
  Ok(HttpResponse::Ok().json(profiles))
}

#[instrument(name = "handler::admin_update_user", skip(app_state, user), fields(admin_id = %user.actor.user_id))]
pub async fn update_user_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<ProfileAdminUpdate>,
) -> Result<HttpResponse> {
  user.require_admin()?;
  let target = path.into_inner();
  let update = payload.into_inner();
  if target == user.actor.user_id && (update.suspended == Some(true) || update.role.is_some_and(|r| r != user.actor.role)) {
    warn!("Admin attempted to suspend or demote themselves.");
    return Err(AppError::Forbidden("Admins cannot suspend or demote their own account.".to_string()));
  }
  let profile = app_state.store.admin_update_profile(target, update).await?;
  info!(user_id = %profile.id, role = %profile.role, suspended = profile.suspended, "Profile updated by admin.");
  Ok(HttpResponse::Ok().json(profile))
}

#[instrument(name = "handler::admin_orders", skip(app_state, user))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  query: web::Query<OrderFilter>,
) -> Result<HttpResponse> {
  user.require_admin()?;
  let orders = app_state.store.list_orders(&query.into_inner()).await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::admin_analytics", skip(app_state, user))]
pub async fn analytics_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  query: web::Query<AnalyticsQuery>,
) -> Result<HttpResponse> {
  user.require_admin()?;
  let to = query.to.unwrap_or_else(|| Utc::now().date_naive());
  let from = query.from.unwrap_or(to - Duration::days(DEFAULT_ANALYTICS_DAYS - 1));
  if from > to {
    return Err(AppError::Validation("'from' must not be after 'to'.".to_string()));
  }
  if (to - from).num_days() >= MAX_ANALYTICS_DAYS {
    return Err(AppError::Validation(format!(
      "Analytics ranges are limited to {} days.",
      MAX_ANALYTICS_DAYS
    )));
  }

  let facts = app_state.store.order_facts().await?;
  Ok(HttpResponse::Ok().json(json!({
    "from": from,
    "to": to,
    "summary": revenue_summary(&facts),
    "status_counts": status_counts(&facts),
    "daily_revenue": daily_revenue(&facts, from, to),
    "top_products": top_products(&facts, TOP_PRODUCTS),
  })))
}

pub async fn get_settings_handler(app_state: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse> {
  user.require_admin()?;
  Ok(HttpResponse::Ok().json(app_state.store.settings().await?))
}

#[instrument(name = "handler::admin_update_settings", skip(app_state, user, payload))]
pub async fn update_settings_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  payload: web::Json<PlatformSettings>,
) -> Result<HttpResponse> {
  user.require_admin()?;
  let settings = payload.into_inner();
  settings.validate()?;
  app_state.store.save_settings(&settings).await?;
  info!(
    maintenance_mode = settings.maintenance_mode,
    allow_registrations = settings.allow_registrations,
    "Platform settings saved."
  );
  app_state
    .events
    .publish(MarketEvent::broadcast(MarketEventKind::SettingsUpdated));
  Ok(HttpResponse::Ok().json(settings))
}

pub async fn list_sessions_handler(app_state: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse> {
  user.require_admin()?;
  let sessions = app_state.store.live_sessions(Utc::now()).await?;
  Ok(HttpResponse::Ok().json(sessions))
}
