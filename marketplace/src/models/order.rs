// marketplace/src/models/order.rs

use crate::models::order_item::OrderItem;
use adaze_core::analytics::{FactLine, OrderFact};
use adaze_core::{OrderParties, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub buyer_id: Uuid,
  pub trader_id: Uuid,
  pub transporter_id: Option<Uuid>,
  #[sqlx(try_from = "String")]
  pub status: OrderStatus,
  pub subtotal_cents: i64,
  pub shipping_fee_cents: i64,
  pub commission_cents: i64,
  pub transporter_fee_cents: i64,
  pub total_cents: i64,
  pub shipping_address: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub delivered_at: Option<DateTime<Utc>>,
}

impl Order {
  pub fn parties(&self) -> OrderParties {
    OrderParties {
      buyer_id: self.buyer_id,
      trader_id: self.trader_id,
      transporter_id: self.transporter_id,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderItem>,
}

impl OrderWithItems {
  pub fn to_fact(&self) -> OrderFact {
    let o = &self.order;
    OrderFact {
      order_id: o.id,
      status: o.status,
      buyer_id: o.buyer_id,
      trader_id: o.trader_id,
      transporter_id: o.transporter_id,
      subtotal_cents: o.subtotal_cents,
      total_cents: o.total_cents,
      commission_cents: o.commission_cents,
      transporter_fee_cents: o.transporter_fee_cents,
      created_at: o.created_at,
      delivered_at: o.delivered_at,
      lines: self
        .items
        .iter()
        .map(|i| FactLine {
          product_id: i.product_id,
          product_name: i.product_name.clone(),
          quantity: i.quantity,
          revenue_cents: i.line_total_cents(),
        })
        .collect(),
    }
  }
}

/// Order listing query. Every set field must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
  pub buyer_id: Option<Uuid>,
  pub trader_id: Option<Uuid>,
  pub transporter_id: Option<Uuid>,
  pub status: Option<OrderStatus>,
  /// Only orders no transporter has claimed yet.
  #[serde(default)]
  pub unassigned: bool,
}

impl OrderFilter {
  pub fn matches(&self, order: &Order) -> bool {
    self.buyer_id.map_or(true, |id| order.buyer_id == id)
      && self.trader_id.map_or(true, |id| order.trader_id == id)
      && self.transporter_id.map_or(true, |id| order.transporter_id == Some(id))
      && self.status.map_or(true, |s| order.status == s)
      && (!self.unassigned || order.transporter_id.is_none())
  }
}
