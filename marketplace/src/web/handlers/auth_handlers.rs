// marketplace/src/web/handlers/auth_handlers.rs

use actix_web::{http::header, web, HttpRequest, HttpResponse};
use adaze_core::{FlowState, Role};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::{AppError, Result};
use crate::models::ProfileUpdate;
use crate::pipelines::contexts::{SigninState, SignupState};
use crate::state::AppState;
use crate::web::handlers::run_flow;
use crate::web::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct SignupPayload {
  pub email: String,
  pub password: String,
  pub full_name: String,
  pub phone: Option<String>,
  #[serde(default = "default_role")]
  pub role: Role,
}

fn default_role() -> Role {
  Role::Buyer
}

#[derive(Deserialize, Debug)]
pub struct SigninPayload {
  pub email: String,
  pub password: String,
}

#[instrument(name = "handler::signup", skip(app_state, payload), fields(email = %payload.email, role = %payload.role))]
pub async fn signup_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<SignupPayload>,
) -> Result<HttpResponse> {
  let payload = payload.into_inner();
  let state = FlowState::new(SignupState {
    app: app_state.get_ref().clone(),
    email: payload.email,
    password: payload.password,
    full_name: payload.full_name,
    phone: payload.phone,
    role: payload.role,
    profile: None,
  });
  run_flow(&app_state, state.clone(), "Signup").await?;

  let profile = state
    .write()
    .profile
    .take()
    .ok_or_else(|| AppError::Internal("Signup completed without creating a profile.".to_string()))?;
  info!(user_id = %profile.id, "Signup successful.");
  Ok(HttpResponse::Created().json(json!({ "user": profile })))
}

#[instrument(name = "handler::signin", skip(app_state, req, payload), fields(email = %payload.email))]
pub async fn signin_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  payload: web::Json<SigninPayload>,
) -> Result<HttpResponse> {
  let payload = payload.into_inner();
  let user_agent = req
    .headers()
    .get(header::USER_AGENT)
    .and_then(|v| v.to_str().ok())
    .map(str::to_string);
  let state = FlowState::new(SigninState {
    app: app_state.get_ref().clone(),
    email: payload.email,
    password: payload.password,
    user_agent,
    profile: None,
    session: None,
  });
  run_flow(&app_state, state.clone(), "Signin").await?;

  let mut guard = state.write();
  let (profile, session) = match (guard.profile.take(), guard.session.take()) {
    (Some(profile), Some(session)) => (profile, session),
    _ => return Err(AppError::Auth("Signin completed without a session.".to_string())),
  };
  Ok(HttpResponse::Ok().json(json!({
    "token": session.token,
    "expires_at": session.expires_at,
    "user": profile,
  })))
}

#[instrument(name = "handler::signout", skip_all, fields(user_id = %user.actor.user_id))]
pub async fn signout_handler(app_state: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse> {
  app_state.store.delete_session(&user.token).await?;
  Ok(HttpResponse::NoContent().finish())
}

pub async fn me_handler(user: AuthenticatedUser) -> Result<HttpResponse> {
  Ok(HttpResponse::Ok().json(user.profile))
}

#[instrument(name = "handler::update_me", skip_all, fields(user_id = %user.actor.user_id))]
pub async fn update_me_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  payload: web::Json<ProfileUpdate>,
) -> Result<HttpResponse> {
  let mut update = payload.into_inner();
  if let Some(name) = update.full_name.as_mut() {
    *name = name.trim().to_string();
    if name.is_empty() {
      return Err(AppError::Validation("Full name cannot be empty.".to_string()));
    }
  }
  let profile = app_state.store.update_profile(user.actor.user_id, update).await?;
  Ok(HttpResponse::Ok().json(profile))
}
