// marketplace/src/errors.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use adaze_core::{DomainError, FlowError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),

  /// A flow stopped early without reporting why.
  #[error("Process halted: {0}")]
  Halted(String),
}

impl From<DomainError> for AppError {
  fn from(err: DomainError) -> Self {
    match err {
      DomainError::Validation(m) => AppError::Validation(m),
      DomainError::Forbidden(m) | DomainError::NotEligible(m) => AppError::Forbidden(m),
      DomainError::Conflict(m) => AppError::Conflict(m),
      e @ DomainError::InvalidTransition { .. } => AppError::Conflict(e.to_string()),
      e @ DomainError::InsufficientStock { .. } => AppError::Conflict(e.to_string()),
    }
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(db_err) => AppError::Sqlx(db_err),
      Err(err) => match err.downcast::<DomainError>() {
        Ok(domain) => domain.into(),
        Err(err) => AppError::Internal(err.to_string()),
      },
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) | AppError::Halted(_) => StatusCode::CONFLICT,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Request rejected");
    }
    let body = match self {
      AppError::Validation(m)
      | AppError::Auth(m)
      | AppError::Forbidden(m)
      | AppError::NotFound(m)
      | AppError::Conflict(m)
      | AppError::Halted(m) => json!({ "error": m }),
      AppError::Sqlx(_) => json!({ "error": "Database operation failed" }),
      AppError::Workflow { source } => json!({ "error": "Workflow processing error", "detail": source.to_string() }),
      AppError::Config(m) | AppError::Internal(m) => json!({ "error": "An internal error occurred", "detail": m }),
    };
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
