// tests/analytics_tests.rs
mod common;

use adaze_core::analytics::{
  buyer_dashboard, daily_revenue, revenue_summary, status_counts, top_products, trader_dashboard, transporter_dashboard,
};
use adaze_core::OrderStatus;
use chrono::NaiveDate;
use common::{at, fact, line};
use uuid::Uuid;

#[test]
fn status_counts_are_zero_filled() {
  let buyer = Uuid::new_v4();
  let trader = Uuid::new_v4();
  let facts = vec![
    fact(OrderStatus::Pending, buyer, trader, 1_000),
    fact(OrderStatus::Pending, buyer, trader, 1_000),
    fact(OrderStatus::Delivered, buyer, trader, 1_000),
  ];

  let counts = status_counts(&facts);
  assert_eq!(counts.len(), 5);
  assert_eq!(counts[&OrderStatus::Pending], 2);
  assert_eq!(counts[&OrderStatus::Delivered], 1);
  assert_eq!(counts[&OrderStatus::Shipped], 0);
  assert_eq!(counts[&OrderStatus::Cancelled], 0);
}

#[test]
fn revenue_summary_splits_by_lifecycle() {
  let buyer = Uuid::new_v4();
  let trader = Uuid::new_v4();
  let facts = vec![
    fact(OrderStatus::Delivered, buyer, trader, 10_000),
    fact(OrderStatus::Delivered, buyer, trader, 5_000),
    fact(OrderStatus::Shipped, buyer, trader, 2_000),
    fact(OrderStatus::Cancelled, buyer, trader, 9_999),
  ];

  let summary = revenue_summary(&facts);
  assert_eq!(summary.total_orders, 4);
  assert_eq!(summary.delivered_orders, 2);
  assert_eq!(summary.cancelled_orders, 1);
  assert_eq!(summary.gross_delivered_cents, 15_000);
  assert_eq!(summary.commission_earned_cents, 1_500);
  assert_eq!(summary.pending_value_cents, 2_000);
  assert_eq!(summary.average_order_value_cents, 7_500);

  assert_eq!(revenue_summary(&[]).average_order_value_cents, 0);
}

#[test]
fn daily_revenue_fills_gaps_and_ignores_out_of_range() {
  let buyer = Uuid::new_v4();
  let trader = Uuid::new_v4();
  let mut early = fact(OrderStatus::Delivered, buyer, trader, 4_000);
  early.delivered_at = Some(at(2, 10));
  let mut late = fact(OrderStatus::Delivered, buyer, trader, 6_000);
  late.delivered_at = Some(at(4, 18));
  let mut outside = fact(OrderStatus::Delivered, buyer, trader, 1_000);
  outside.delivered_at = Some(at(9, 9));
  let pending = fact(OrderStatus::Pending, buyer, trader, 3_000);
  let facts = vec![early, late, outside, pending];

  let from = NaiveDate::from_ymd_opt(2024, 3, 2).expect("valid date");
  let to = NaiveDate::from_ymd_opt(2024, 3, 4).expect("valid date");
  let days = daily_revenue(&facts, from, to);

  assert_eq!(days.len(), 3);
  assert_eq!(days[0].revenue_cents, 4_000);
  assert_eq!(days[1].revenue_cents, 0);
  assert_eq!(days[1].orders, 0);
  assert_eq!(days[2].revenue_cents, 6_000);
  assert_eq!(days[2].day, to);

  assert!(daily_revenue(&facts, to, from).is_empty());
}

#[test]
fn top_products_ignore_cancelled_orders_and_break_ties_by_revenue() {
  let buyer = Uuid::new_v4();
  let trader = Uuid::new_v4();
  let rice = Uuid::new_v4();
  let oil = Uuid::new_v4();
  let beans = Uuid::new_v4();

  let mut a = fact(OrderStatus::Delivered, buyer, trader, 0);
  a.lines = vec![line(rice, "Rice", 3, 3_000), line(oil, "Oil", 3, 4_500)];
  let mut b = fact(OrderStatus::Pending, buyer, trader, 0);
  b.lines = vec![line(beans, "Beans", 1, 900)];
  let mut c = fact(OrderStatus::Cancelled, buyer, trader, 0);
  c.lines = vec![line(beans, "Beans", 50, 45_000)];

  let facts = vec![a, b, c];
  let top = top_products(&facts, 2);

  assert_eq!(top.len(), 2);
  assert_eq!(top[0].product_id, oil);
  assert_eq!(top[1].product_id, rice);
  assert_eq!(top[1].units, 3);

  let all = top_products(&facts, 10);
  assert_eq!(all.len(), 3);
  assert_eq!(all[2].units, 1);
}

#[test]
fn role_dashboards_scope_to_the_user() {
  let buyer = Uuid::new_v4();
  let other_buyer = Uuid::new_v4();
  let trader = Uuid::new_v4();
  let transporter = Uuid::new_v4();

  let mut delivered = fact(OrderStatus::Delivered, buyer, trader, 10_000);
  delivered.transporter_id = Some(transporter);
  let mut shipping = fact(OrderStatus::Shipped, buyer, trader, 4_000);
  shipping.transporter_id = Some(transporter);
  let pending = fact(OrderStatus::Pending, other_buyer, trader, 2_000);
  let cancelled = fact(OrderStatus::Cancelled, buyer, Uuid::new_v4(), 7_000);
  let facts = vec![delivered, shipping, pending, cancelled];

  let trader_view = trader_dashboard(&facts, trader);
  assert_eq!(trader_view.total_orders, 3);
  assert_eq!(trader_view.awaiting_confirmation, 1);
  assert_eq!(trader_view.gross_sales_cents, 10_000);
  // subtotal - commission (10%) - transporter fee (5%)
  assert_eq!(trader_view.earnings_cents, 8_500);

  let transporter_view = transporter_dashboard(&facts, transporter);
  assert_eq!(transporter_view.assigned, 2);
  assert_eq!(transporter_view.in_transit, 1);
  assert_eq!(transporter_view.delivered, 1);
  assert_eq!(transporter_view.earnings_cents, 500);
  assert_eq!(transporter_view.pending_earnings_cents, 200);

  let buyer_view = buyer_dashboard(&facts, buyer);
  assert_eq!(buyer_view.total_orders, 3);
  assert_eq!(buyer_view.active_orders, 1);
  assert_eq!(buyer_view.total_spent_cents, 14_000);
  assert_eq!(buyer_view.status_counts[&OrderStatus::Cancelled], 1);
}
