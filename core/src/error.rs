// core/src/error.rs

use crate::order::OrderStatus;
use anyhow::Error as AnyhowError;
use thiserror::Error;
use uuid::Uuid;

/// Failures raised by the flow engine itself, as opposed to the handlers it runs.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Stage not found: {stage}")]
  StageNotFound { stage: String },

  #[error("Handler missing for required stage: {stage}")]
  HandlerMissing { stage: String },

  #[error("Sub-state extraction failed for stage '{stage}'. Source: {source}")]
  ExtractorFailure {
    stage: String,
    #[source]
    source: AnyhowError,
  },

  #[error("State type mismatch in '{stage}' (expected {expected_type})")]
  TypeMismatch { stage: String, expected_type: String },

  #[error("Error in handler or external operation. Source: {source}")]
  Handler {
    #[source]
    source: AnyhowError,
  },

  #[error("Flow configuration error in '{stage}': {message}")]
  Configuration { stage: String, message: String },

  #[error("Internal flow error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    FlowError::Handler { source: err }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;

/// A marketplace rule was broken. These carry enough detail for a 4xx response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
  #[error("Cannot move an order from '{from}' to '{to}'")]
  InvalidTransition { from: OrderStatus, to: OrderStatus },

  #[error("Not permitted: {0}")]
  Forbidden(String),

  #[error("Invalid input: {0}")]
  Validation(String),

  #[error("Not eligible: {0}")]
  NotEligible(String),

  #[error("Insufficient stock for product {product_id}: {available} available, {requested} requested")]
  InsufficientStock {
    product_id: Uuid,
    available: i32,
    requested: i32,
  },

  #[error("Conflict: {0}")]
  Conflict(String),
}

pub type DomainResult<T> = std::result::Result<T, DomainError>;
