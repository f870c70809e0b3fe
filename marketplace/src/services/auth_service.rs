// marketplace/src/services/auth_service.rs

//! Password hashing and session tokens.

use crate::errors::AppError;
use crate::models::Session;
use argon2::{
  password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore};
use std::fmt::Write;
use tracing::{debug, error, instrument};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 8;
const TOKEN_BYTES: usize = 32;

/// Hashes a plain-text password with Argon2 and a fresh random salt.
#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, AppError> {
  if password.is_empty() {
    return Err(AppError::Validation("Password cannot be empty.".to_string()));
  }

  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|argon_err| {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      AppError::Internal(format!("Password hashing process failed: {}", argon_err))
    })
}

/// `Ok(false)` on a wrong password. A stored hash that cannot be parsed is an internal error.
#[instrument(
  name = "auth_service::verify_password",
  skip(stored_hash, provided_password),
  err(Display),
  fields(hash_len = stored_hash.len())
)]
pub fn verify_password(stored_hash: &str, provided_password: &str) -> Result<bool, AppError> {
  if provided_password.is_empty() {
    return Ok(false);
  }

  let parsed_hash = PasswordHash::new(stored_hash).map_err(|parse_err| {
    error!(error = %parse_err, "Failed to parse stored password hash string.");
    AppError::Internal(format!("Invalid stored password hash format: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password verification failed: Passwords do not match.");
      Ok(false)
    }
    Err(other) => {
      error!(error = %other, "Argon2 password verification process encountered an error.");
      Err(AppError::Internal(format!("Password verification process failed: {}", other)))
    }
  }
}

/// 256 random bits, hex encoded.
pub fn generate_session_token() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  bytes.iter().fold(String::with_capacity(TOKEN_BYTES * 2), |mut out, b| {
    let _ = write!(out, "{:02x}", b);
    out
  })
}

pub fn new_session(user_id: Uuid, ttl_hours: i64, user_agent: Option<String>, now: DateTime<Utc>) -> Session {
  Session {
    token: generate_session_token(),
    user_id,
    created_at: now,
    expires_at: now + Duration::hours(ttl_hours),
    user_agent,
  }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
  let (scheme, token) = header_value.trim().split_once(' ')?;
  let token = token.trim();
  (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
