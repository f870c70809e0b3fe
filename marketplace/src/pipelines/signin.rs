// marketplace/src/pipelines/signin.rs

use crate::errors::AppError;
use crate::pipelines::contexts::SigninState;
use crate::services::auth_service;
use adaze_core::{Flow, FlowControl, FlowState};
use chrono::Utc;
use tracing::{info, instrument, warn};

const INVALID_CREDENTIALS: &str = "Invalid email or password.";

pub fn build_signin_flow() -> Flow<SigninState, AppError> {
  let mut flow = Flow::new(&[
    ("validate_input", false),
    ("load_profile", false),
    ("verify_password", false),
    ("reject_suspended", false),
    ("issue_session", false),
  ]);
  flow.on("validate_input", validate_input);
  flow.on("load_profile", load_profile);
  flow.on("verify_password", verify_password);
  flow.on("reject_suspended", reject_suspended);
  flow.on("issue_session", issue_session);
  flow
}

#[instrument(name = "signin::validate_input", skip_all)]
async fn validate_input(state: FlowState<SigninState>) -> Result<FlowControl, AppError> {
  let mut guard = state.write();
  guard.email = guard.email.trim().to_lowercase();
  if guard.email.is_empty() || guard.password.is_empty() {
    return Err(AppError::Validation("Email and password are required.".to_string()));
  }
  Ok(FlowControl::Continue)
}

#[instrument(name = "signin::load_profile", skip_all)]
async fn load_profile(state: FlowState<SigninState>) -> Result<FlowControl, AppError> {
  let (store, email) = {
    let guard = state.read();
    (guard.app.store.clone(), guard.email.clone())
  };
  match store.profile_by_email(&email).await? {
    Some(profile) => {
      state.write().profile = Some(profile);
      Ok(FlowControl::Continue)
    }
    None => {
      warn!(%email, "Signin for unknown email.");
      Err(AppError::Auth(INVALID_CREDENTIALS.to_string()))
    }
  }
}

#[instrument(name = "signin::verify_password", skip_all)]
async fn verify_password(state: FlowState<SigninState>) -> Result<FlowControl, AppError> {
  let guard = state.read();
  let profile = guard
    .profile
    .as_ref()
    .ok_or_else(|| AppError::Internal("Profile missing before password check.".to_string()))?;
  if auth_service::verify_password(&profile.password_hash, &guard.password)? {
    Ok(FlowControl::Continue)
  } else {
    warn!(user_id = %profile.id, "Signin with wrong password.");
    Err(AppError::Auth(INVALID_CREDENTIALS.to_string()))
  }
}

#[instrument(name = "signin::reject_suspended", skip_all)]
async fn reject_suspended(state: FlowState<SigninState>) -> Result<FlowControl, AppError> {
  let guard = state.read();
  match &guard.profile {
    Some(profile) if profile.suspended => {
      warn!(user_id = %profile.id, "Suspended account attempted to sign in.");
      Err(AppError::Forbidden("This account has been suspended.".to_string()))
    }
    _ => Ok(FlowControl::Continue),
  }
}

#[instrument(name = "signin::issue_session", skip_all)]
async fn issue_session(state: FlowState<SigninState>) -> Result<FlowControl, AppError> {
  let (store, session) = {
    let guard = state.read();
    let user_id = guard
      .profile
      .as_ref()
      .map(|p| p.id)
      .ok_or_else(|| AppError::Internal("Profile missing before session issue.".to_string()))?;
    (
      guard.app.store.clone(),
      auth_service::new_session(
        user_id,
        guard.app.config.session_ttl_hours,
        guard.user_agent.clone(),
        Utc::now(),
      ),
    )
  };
  store.create_session(session.clone()).await?;
  info!(user_id = %session.user_id, expires_at = %session.expires_at, "Session issued.");
  state.write().session = Some(session);
  Ok(FlowControl::Continue)
}
