// marketplace/src/models/order_item.rs

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A purchased line. Name and price are copied at checkout so later product edits do not rewrite history.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub product_name: String,
  pub quantity: i32,
  pub unit_price_cents: i64,
}

impl OrderItem {
  pub fn line_total_cents(&self) -> i64 {
    self.unit_price_cents * i64::from(self.quantity)
  }
}
