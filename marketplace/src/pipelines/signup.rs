// marketplace/src/pipelines/signup.rs

use crate::errors::AppError;
use crate::models::NewProfile;
use crate::pipelines::contexts::SignupState;
use crate::services::auth_service::{self, MIN_PASSWORD_LEN};
use adaze_core::{Flow, FlowControl, FlowState};
use tracing::{event, info, instrument, warn, Level};

pub fn build_signup_flow() -> Flow<SignupState, AppError> {
  let mut flow = Flow::new(&[
    ("registrations_open", false),
    ("validate_input", false),
    ("check_existing_email", false),
    ("create_profile", false),
  ]);
  flow.on("registrations_open", registrations_open);
  flow.on("validate_input", validate_input);
  flow.on("check_existing_email", check_existing_email);
  flow.on("create_profile", create_profile);
  flow
}

#[instrument(name = "signup::registrations_open", skip_all)]
async fn registrations_open(state: FlowState<SignupState>) -> Result<FlowControl, AppError> {
  let store = state.read().app.store.clone();
  if !store.settings().await?.allow_registrations {
    warn!("Signup attempted while registrations are closed.");
    return Err(AppError::Forbidden("Registrations are currently closed.".to_string()));
  }
  Ok(FlowControl::Continue)
}

#[instrument(name = "signup::validate_input", skip_all)]
async fn validate_input(state: FlowState<SignupState>) -> Result<FlowControl, AppError> {
  let mut guard = state.write();
  guard.email = guard.email.trim().to_lowercase();
  guard.full_name = guard.full_name.trim().to_string();
  guard.phone = guard.phone.take().map(|p| p.trim().to_string()).filter(|p| !p.is_empty());

  event!(Level::DEBUG, email = %guard.email, role = %guard.role, "Validating signup input.");
  let email = &guard.email;
  let well_formed = match email.split_once('@') {
    Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
    None => false,
  };
  if !well_formed {
    return Err(AppError::Validation("A valid email is required.".to_string()));
  }
  if guard.password.chars().count() < MIN_PASSWORD_LEN {
    return Err(AppError::Validation(format!(
      "Password must be at least {} characters long.",
      MIN_PASSWORD_LEN
    )));
  }
  if guard.full_name.is_empty() {
    return Err(AppError::Validation("Full name is required.".to_string()));
  }
  if !guard.role.self_assignable() {
    return Err(AppError::Forbidden(format!("The {} role cannot be chosen at signup.", guard.role)));
  }
  Ok(FlowControl::Continue)
}

#[instrument(name = "signup::check_existing_email", skip_all)]
async fn check_existing_email(state: FlowState<SignupState>) -> Result<FlowControl, AppError> {
  let (store, email) = {
    let guard = state.read();
    (guard.app.store.clone(), guard.email.clone())
  };
  if store.profile_by_email(&email).await?.is_some() {
    warn!(%email, "Attempt to sign up with an existing email.");
    return Err(AppError::Conflict("An account with this email already exists.".to_string()));
  }
  Ok(FlowControl::Continue)
}

#[instrument(name = "signup::create_profile", skip_all)]
async fn create_profile(state: FlowState<SignupState>) -> Result<FlowControl, AppError> {
  let (store, new_profile, password) = {
    let guard = state.read();
    (
      guard.app.store.clone(),
      NewProfile {
        email: guard.email.clone(),
        password_hash: String::new(),
        full_name: guard.full_name.clone(),
        phone: guard.phone.clone(),
        role: guard.role,
      },
      guard.password.clone(),
    )
  };
  let password_hash = auth_service::hash_password(&password)?;
  let profile = store
    .create_profile(NewProfile {
      password_hash,
      ..new_profile
    })
    .await?;
  info!(user_id = %profile.id, role = %profile.role, "Profile created.");
  state.write().profile = Some(profile);
  Ok(FlowControl::Continue)
}
