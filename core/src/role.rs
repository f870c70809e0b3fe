// core/src/role.rs

//! Marketplace roles and the acting user.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Buyer,
  Trader,
  Transporter,
  Wholesaler,
  Admin,
}

impl Role {
  pub const ALL: [Role; 5] = [Role::Buyer, Role::Trader, Role::Transporter, Role::Wholesaler, Role::Admin];

  pub fn as_str(self) -> &'static str {
    match self {
      Role::Buyer => "buyer",
      Role::Trader => "trader",
      Role::Transporter => "transporter",
      Role::Wholesaler => "wholesaler",
      Role::Admin => "admin",
    }
  }

  /// Roles that may list products.
  pub fn sells(self) -> bool {
    matches!(self, Role::Trader | Role::Wholesaler)
  }

  /// Roles that may check out a cart. Wholesalers buy stock as well as sell it.
  pub fn buys(self) -> bool {
    matches!(self, Role::Buyer | Role::Wholesaler)
  }

  /// Admin accounts are only created from the console.
  pub fn self_assignable(self) -> bool {
    !matches!(self, Role::Admin)
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "buyer" => Ok(Role::Buyer),
      "trader" | "seller" => Ok(Role::Trader),
      "transporter" => Ok(Role::Transporter),
      "wholesaler" => Ok(Role::Wholesaler),
      "admin" => Ok(Role::Admin),
      other => Err(DomainError::Validation(format!("unknown role '{}'", other))),
    }
  }
}

impl TryFrom<String> for Role {
  type Error = DomainError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

/// Who is performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub user_id: Uuid,
  pub role: Role,
}

impl Actor {
  pub fn new(user_id: Uuid, role: Role) -> Self {
    Self { user_id, role }
  }

  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }
}
