// core/src/analytics.rs

//! Aggregations behind the admin console and the per-role dashboards.

use crate::order::OrderStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactLine {
  pub product_id: Uuid,
  pub product_name: String,
  pub quantity: i32,
  pub revenue_cents: i64,
}

/// Flattened view of an order and its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFact {
  pub order_id: Uuid,
  pub status: OrderStatus,
  pub buyer_id: Uuid,
  pub trader_id: Uuid,
  pub transporter_id: Option<Uuid>,
  pub subtotal_cents: i64,
  pub total_cents: i64,
  pub commission_cents: i64,
  pub transporter_fee_cents: i64,
  pub created_at: DateTime<Utc>,
  pub delivered_at: Option<DateTime<Utc>>,
  pub lines: Vec<FactLine>,
}

impl OrderFact {
  /// What the seller keeps once the order is delivered.
  pub fn trader_earnings_cents(&self) -> i64 {
    self.subtotal_cents - self.commission_cents - self.transporter_fee_cents
  }

  fn revenue_day(&self) -> NaiveDate {
    self.delivered_at.unwrap_or(self.created_at).date_naive()
  }
}

pub fn status_counts<'a, I>(facts: I) -> BTreeMap<OrderStatus, u64>
where
  I: IntoIterator<Item = &'a OrderFact>,
{
  let mut counts: BTreeMap<OrderStatus, u64> = OrderStatus::ALL.into_iter().map(|s| (s, 0)).collect();
  for fact in facts {
    *counts.entry(fact.status).or_default() += 1;
  }
  counts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RevenueSummary {
  pub total_orders: u64,
  pub delivered_orders: u64,
  pub cancelled_orders: u64,
  /// Sum of delivered order totals.
  pub gross_delivered_cents: i64,
  pub commission_earned_cents: i64,
  /// Sum of totals still moving through the pipeline.
  pub pending_value_cents: i64,
  pub average_order_value_cents: i64,
}

pub fn revenue_summary(facts: &[OrderFact]) -> RevenueSummary {
  let mut summary = RevenueSummary {
    total_orders: facts.len() as u64,
    ..Default::default()
  };
  for fact in facts {
    match fact.status {
      OrderStatus::Delivered => {
        summary.delivered_orders += 1;
        summary.gross_delivered_cents += fact.total_cents;
        summary.commission_earned_cents += fact.commission_cents;
      }
      OrderStatus::Cancelled => summary.cancelled_orders += 1,
      _ => summary.pending_value_cents += fact.total_cents,
    }
  }
  if summary.delivered_orders > 0 {
    summary.average_order_value_cents = summary.gross_delivered_cents / summary.delivered_orders as i64;
  }
  summary
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRevenue {
  pub day: NaiveDate,
  pub orders: u64,
  pub revenue_cents: i64,
}

/// Delivered revenue per day over `[from, to]`, with empty days present as zero.
pub fn daily_revenue(facts: &[OrderFact], from: NaiveDate, to: NaiveDate) -> Vec<DailyRevenue> {
  if from > to {
    return Vec::new();
  }
  let mut by_day: BTreeMap<NaiveDate, DailyRevenue> = from
    .iter_days()
    .take_while(|d| *d <= to)
    .map(|day| {
      (
        day,
        DailyRevenue {
          day,
          orders: 0,
          revenue_cents: 0,
        },
      )
    })
    .collect();
  for fact in facts.iter().filter(|f| f.status == OrderStatus::Delivered) {
    if let Some(slot) = by_day.get_mut(&fact.revenue_day()) {
      slot.orders += 1;
      slot.revenue_cents += fact.total_cents;
    }
  }
  by_day.into_values().collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSales {
  pub product_id: Uuid,
  pub product_name: String,
  pub units: i64,
  pub revenue_cents: i64,
}

/// Best sellers by units across orders that were not cancelled.
pub fn top_products<'a, I>(facts: I, limit: usize) -> Vec<ProductSales>
where
  I: IntoIterator<Item = &'a OrderFact>,
{
  let mut by_product: HashMap<Uuid, ProductSales> = HashMap::new();
  for fact in facts.into_iter().filter(|f| f.status != OrderStatus::Cancelled) {
    for line in &fact.lines {
      let entry = by_product.entry(line.product_id).or_insert_with(|| ProductSales {
        product_id: line.product_id,
        product_name: line.product_name.clone(),
        units: 0,
        revenue_cents: 0,
      });
      entry.units += i64::from(line.quantity);
      entry.revenue_cents += line.revenue_cents;
    }
  }
  let mut ranked: Vec<ProductSales> = by_product.into_values().collect();
  ranked.sort_by(|a, b| {
    b.units
      .cmp(&a.units)
      .then_with(|| b.revenue_cents.cmp(&a.revenue_cents))
      .then_with(|| a.product_id.cmp(&b.product_id))
  });
  ranked.truncate(limit);
  ranked
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraderDashboard {
  pub total_orders: u64,
  pub status_counts: BTreeMap<OrderStatus, u64>,
  /// Orders waiting on the trader to confirm.
  pub awaiting_confirmation: u64,
  pub gross_sales_cents: i64,
  pub earnings_cents: i64,
  pub top_products: Vec<ProductSales>,
}

pub fn trader_dashboard(facts: &[OrderFact], trader_id: Uuid) -> TraderDashboard {
  let mine: Vec<&OrderFact> = facts.iter().filter(|f| f.trader_id == trader_id).collect();
  let delivered = mine.iter().filter(|f| f.status == OrderStatus::Delivered);
  TraderDashboard {
    total_orders: mine.len() as u64,
    status_counts: status_counts(mine.iter().copied()),
    awaiting_confirmation: mine.iter().filter(|f| f.status == OrderStatus::Pending).count() as u64,
    gross_sales_cents: delivered.clone().map(|f| f.subtotal_cents).sum(),
    earnings_cents: delivered.map(|f| f.trader_earnings_cents()).sum(),
    top_products: top_products(mine.iter().copied(), 5),
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransporterDashboard {
  pub assigned: u64,
  pub awaiting_pickup: u64,
  pub in_transit: u64,
  pub delivered: u64,
  pub earnings_cents: i64,
  /// Fees on deliveries that are assigned but not finished.
  pub pending_earnings_cents: i64,
}

pub fn transporter_dashboard(facts: &[OrderFact], transporter_id: Uuid) -> TransporterDashboard {
  let mut dash = TransporterDashboard::default();
  for fact in facts.iter().filter(|f| f.transporter_id == Some(transporter_id)) {
    dash.assigned += 1;
    match fact.status {
      OrderStatus::Confirmed => {
        dash.awaiting_pickup += 1;
        dash.pending_earnings_cents += fact.transporter_fee_cents;
      }
      OrderStatus::Shipped => {
        dash.in_transit += 1;
        dash.pending_earnings_cents += fact.transporter_fee_cents;
      }
      OrderStatus::Delivered => {
        dash.delivered += 1;
        dash.earnings_cents += fact.transporter_fee_cents;
      }
      OrderStatus::Pending | OrderStatus::Cancelled => {}
    }
  }
  dash
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyerDashboard {
  pub total_orders: u64,
  pub active_orders: u64,
  pub status_counts: BTreeMap<OrderStatus, u64>,
  /// Sum of totals over orders that were not cancelled.
  pub total_spent_cents: i64,
}

pub fn buyer_dashboard(facts: &[OrderFact], buyer_id: Uuid) -> BuyerDashboard {
  let mine: Vec<&OrderFact> = facts.iter().filter(|f| f.buyer_id == buyer_id).collect();
  BuyerDashboard {
    total_orders: mine.len() as u64,
    active_orders: mine.iter().filter(|f| f.status.is_active()).count() as u64,
    status_counts: status_counts(mine.iter().copied()),
    total_spent_cents: mine
      .iter()
      .filter(|f| f.status != OrderStatus::Cancelled)
      .map(|f| f.total_cents)
      .sum(),
  }
}
