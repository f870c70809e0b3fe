// marketplace/src/web/extractors.rs

use crate::errors::AppError;
use crate::models::Profile;
use crate::services::auth_service::bearer_token;
use crate::state::AppState;
use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use adaze_core::Actor;
use chrono::Utc;
use futures_util::future::LocalBoxFuture;
use tracing::warn;

/// A signed-in, non-suspended user resolved from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub actor: Actor,
  pub profile: Profile,
  pub token: String,
}

impl AuthenticatedUser {
  pub fn require_admin(&self) -> Result<(), AppError> {
    if self.actor.is_admin() {
      Ok(())
    } else {
      Err(AppError::Forbidden("Admin access required.".to_string()))
    }
  }

  pub fn require_seller(&self) -> Result<(), AppError> {
    if self.actor.role.sells() || self.actor.is_admin() {
      Ok(())
    } else {
      Err(AppError::Forbidden("Only traders and wholesalers can manage products.".to_string()))
    }
  }
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let app_state = req.app_data::<web::Data<AppState>>().cloned();
    let token = req
      .headers()
      .get(header::AUTHORIZATION)
      .and_then(|value| value.to_str().ok())
      .and_then(bearer_token)
      .map(str::to_string);

    Box::pin(async move {
      let app_state =
        app_state.ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;
      let token = token.ok_or_else(|| AppError::Auth("Missing bearer token.".to_string()))?;

      let session = app_state
        .store
        .session(&token)
        .await?
        .filter(|s| s.is_live(Utc::now()))
        .ok_or_else(|| AppError::Auth("Session is invalid or has expired.".to_string()))?;

      let profile = app_state
        .store
        .profile(session.user_id)
        .await?
        .ok_or_else(|| AppError::Auth("Session user no longer exists.".to_string()))?;
      if profile.suspended {
        warn!(user_id = %profile.id, "Suspended account rejected.");
        return Err(AppError::Forbidden("This account has been suspended.".to_string()));
      }

      Ok(AuthenticatedUser {
        actor: profile.actor(),
        profile,
        token,
      })
    })
  }
}
