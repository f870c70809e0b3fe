// marketplace/src/models/session.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Row of `active_sessions`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Session {
  #[serde(skip_serializing)]
  pub token: String,
  pub user_id: Uuid,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
  pub user_agent: Option<String>,
}

impl Session {
  pub fn is_live(&self, now: DateTime<Utc>) -> bool {
    self.expires_at > now
  }
}
