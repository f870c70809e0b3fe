// core/src/order.rs

//! Order status state machine.
//!
//! ```text
//! pending ──► confirmed ──► shipped ──► delivered
//!    │            │
//!    └────────────┴──► cancelled
//! ```
//!
//! Every edge is gated by who is acting and how they relate to the order.

use crate::error::{DomainError, DomainResult};
use crate::role::{Actor, Role};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  /// Handed to a transporter. Transporter dashboards call this "in transit".
  #[serde(alias = "in_transit")]
  Shipped,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Confirmed => "confirmed",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
    }
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
  }

  pub fn is_active(self) -> bool {
    !self.is_terminal()
  }

  pub fn can_transition_to(self, to: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
      (self, to),
      (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Shipped) | (Confirmed, Cancelled) | (Shipped, Delivered)
    )
  }

  pub fn allowed_targets(self) -> Vec<OrderStatus> {
    OrderStatus::ALL
      .into_iter()
      .filter(|to| self.can_transition_to(*to))
      .collect()
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
      "pending" => Ok(OrderStatus::Pending),
      "confirmed" => Ok(OrderStatus::Confirmed),
      "shipped" | "in_transit" => Ok(OrderStatus::Shipped),
      "delivered" => Ok(OrderStatus::Delivered),
      "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
      other => Err(DomainError::Validation(format!("unknown order status '{}'", other))),
    }
  }
}

impl TryFrom<String> for OrderStatus {
  type Error = DomainError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

/// The people attached to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderParties {
  pub buyer_id: Uuid,
  pub trader_id: Uuid,
  pub transporter_id: Option<Uuid>,
}

impl OrderParties {
  pub fn is_buyer(&self, actor: &Actor) -> bool {
    self.buyer_id == actor.user_id
  }

  pub fn is_trader(&self, actor: &Actor) -> bool {
    self.trader_id == actor.user_id
  }

  pub fn is_transporter(&self, actor: &Actor) -> bool {
    actor.role == Role::Transporter && self.transporter_id == Some(actor.user_id)
  }
}

/// Follow-up work implied by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TransitionEffects {
  /// Item quantities go back to stock.
  pub restock: bool,
  /// Trader and transporter earnings become final.
  pub settle: bool,
}

fn describe(status: OrderStatus) -> &'static str {
  match status {
    OrderStatus::Confirmed => "confirm",
    OrderStatus::Shipped => "ship",
    OrderStatus::Delivered => "mark as delivered",
    OrderStatus::Cancelled => "cancel",
    OrderStatus::Pending => "reopen",
  }
}

/// Checks that `actor` may move an order from `from` to `to`.
///
/// Edge validity is checked first, so an impossible move reports
/// `InvalidTransition` no matter who asks.
pub fn authorize_transition(
  from: OrderStatus,
  to: OrderStatus,
  actor: &Actor,
  parties: &OrderParties,
) -> DomainResult<TransitionEffects> {
  if !from.can_transition_to(to) {
    return Err(DomainError::InvalidTransition { from, to });
  }

  let admin = actor.is_admin();
  let buyer = parties.is_buyer(actor);
  let trader = parties.is_trader(actor);
  let transporter = parties.is_transporter(actor);

  let permitted = admin
    || match (from, to) {
      (OrderStatus::Pending, OrderStatus::Confirmed) => trader,
      (OrderStatus::Pending, OrderStatus::Cancelled) => buyer || trader,
      (OrderStatus::Confirmed, OrderStatus::Shipped) => trader || transporter,
      (OrderStatus::Confirmed, OrderStatus::Cancelled) => trader,
      (OrderStatus::Shipped, OrderStatus::Delivered) => transporter || buyer,
      _ => false,
    };

  if !permitted {
    return Err(DomainError::Forbidden(format!(
      "a {} who is not a party to this step cannot {} a {} order",
      actor.role,
      describe(to),
      from
    )));
  }

  Ok(TransitionEffects {
    restock: to == OrderStatus::Cancelled,
    settle: to == OrderStatus::Delivered,
  })
}

/// A transporter picks up a confirmed order nobody is delivering yet.
pub fn authorize_claim(status: OrderStatus, actor: &Actor, parties: &OrderParties) -> DomainResult<()> {
  if actor.role != Role::Transporter {
    return Err(DomainError::Forbidden("only transporters can claim deliveries".to_string()));
  }
  if status != OrderStatus::Confirmed {
    return Err(DomainError::Conflict(format!(
      "only confirmed orders can be claimed, this one is {}",
      status
    )));
  }
  match parties.transporter_id {
    Some(existing) if existing == actor.user_id => Err(DomainError::Conflict(
      "you are already delivering this order".to_string(),
    )),
    Some(_) => Err(DomainError::Conflict("order already has a transporter".to_string())),
    None => Ok(()),
  }
}

/// Parties to the order and admins may see it.
pub fn can_view(actor: &Actor, parties: &OrderParties) -> bool {
  actor.is_admin()
    || parties.buyer_id == actor.user_id
    || parties.trader_id == actor.user_id
    || parties.transporter_id == Some(actor.user_id)
}
