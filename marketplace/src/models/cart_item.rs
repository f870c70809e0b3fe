// marketplace/src/models/cart_item.rs

use adaze_core::checkout::{sum_line_totals, CartLine};
use adaze_core::DomainResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CartItem {
  pub id: Uuid,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub added_at: DateTime<Utc>,
}

/// The cart as shown to its owner.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
  pub lines: Vec<CartLine>,
  pub item_count: i32,
  pub subtotal_cents: i64,
}

impl CartView {
  pub fn from_lines(lines: Vec<CartLine>) -> DomainResult<Self> {
    Ok(Self {
      item_count: lines.iter().map(|l| l.quantity).sum(),
      subtotal_cents: sum_line_totals(&lines)?,
      lines,
    })
  }
}
