// marketplace/src/models/profile.rs

use adaze_core::{Actor, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
  pub id: Uuid,
  pub email: String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub full_name: String,
  pub phone: Option<String>,
  #[sqlx(try_from = "String")]
  pub role: Role,
  pub suspended: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Profile {
  pub fn actor(&self) -> Actor {
    Actor::new(self.id, self.role)
  }
}

#[derive(Debug, Clone)]
pub struct NewProfile {
  pub email: String,
  pub password_hash: String,
  pub full_name: String,
  pub phone: Option<String>,
  pub role: Role,
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
  pub full_name: Option<String>,
  pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileAdminUpdate {
  pub role: Option<Role>,
  pub suspended: Option<bool>,
}
