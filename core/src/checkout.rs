// core/src/checkout.rs

//! Turns a cart into one order draft per seller.

use crate::error::{DomainError, DomainResult};
use crate::settings::{apply_bps, PlatformSettings};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A cart row joined with the product it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
  pub product_id: Uuid,
  pub trader_id: Uuid,
  pub name: String,
  pub unit_price_cents: i64,
  pub quantity: i32,
  pub stock_available: i32,
  pub active: bool,
}

impl CartLine {
  pub fn line_total_cents(&self) -> DomainResult<i64> {
    self
      .unit_price_cents
      .checked_mul(i64::from(self.quantity))
      .ok_or_else(|| total_too_large(&self.name))
  }
}

fn total_too_large(what: &str) -> DomainError {
  DomainError::Validation(format!("total for '{}' is too large", what))
}

/// Sums line totals, failing instead of wrapping.
pub fn sum_line_totals<'a, I>(lines: I) -> DomainResult<i64>
where
  I: IntoIterator<Item = &'a CartLine>,
{
  lines.into_iter().try_fold(0i64, |acc, line| {
    acc
      .checked_add(line.line_total_cents()?)
      .ok_or_else(|| total_too_large(&line.name))
  })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftLine {
  pub product_id: Uuid,
  pub product_name: String,
  pub quantity: i32,
  pub unit_price_cents: i64,
}

/// Everything needed to write one order row and its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
  pub trader_id: Uuid,
  pub lines: Vec<DraftLine>,
  pub subtotal_cents: i64,
  pub shipping_fee_cents: i64,
  pub commission_cents: i64,
  pub transporter_fee_cents: i64,
  pub total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutPlan {
  pub buyer_id: Uuid,
  pub orders: Vec<OrderDraft>,
  pub grand_total_cents: i64,
}

impl CheckoutPlan {
  pub fn item_count(&self) -> i32 {
    self.orders.iter().flat_map(|o| &o.lines).map(|l| l.quantity).sum()
  }
}

/// Checks a quantity a buyer asks for against the platform cap.
pub fn validate_quantity(quantity: i32, settings: &PlatformSettings) -> DomainResult<()> {
  if quantity <= 0 {
    return Err(DomainError::Validation("quantity must be a positive number".to_string()));
  }
  if quantity > settings.max_cart_quantity {
    return Err(DomainError::Validation(format!(
      "at most {} of one product per order",
      settings.max_cart_quantity
    )));
  }
  Ok(())
}

/// Validates the cart and groups it per seller, keeping first-appearance order.
pub fn plan_checkout(buyer_id: Uuid, lines: &[CartLine], settings: &PlatformSettings) -> DomainResult<CheckoutPlan> {
  if lines.is_empty() {
    return Err(DomainError::Validation("cart is empty".to_string()));
  }

  let mut grouped: Vec<(Uuid, Vec<&CartLine>)> = Vec::new();
  for line in lines {
    validate_quantity(line.quantity, settings)?;
    if !line.active {
      return Err(DomainError::Validation(format!("'{}' is no longer available", line.name)));
    }
    if line.trader_id == buyer_id {
      return Err(DomainError::Forbidden(format!("you cannot buy your own product '{}'", line.name)));
    }
    if line.quantity > line.stock_available {
      return Err(DomainError::InsufficientStock {
        product_id: line.product_id,
        available: line.stock_available,
        requested: line.quantity,
      });
    }
    match grouped.iter_mut().find(|(trader, _)| *trader == line.trader_id) {
      Some((_, group)) => group.push(line),
      None => grouped.push((line.trader_id, vec![line])),
    }
  }

  let orders = grouped
    .into_iter()
    .map(|(trader_id, group)| -> DomainResult<OrderDraft> {
      let subtotal_cents = sum_line_totals(group.iter().copied())?;
      let shipping_fee_cents = settings.shipping_fee_for(subtotal_cents);
      Ok(OrderDraft {
        trader_id,
        lines: group
          .iter()
          .map(|l| DraftLine {
            product_id: l.product_id,
            product_name: l.name.clone(),
            quantity: l.quantity,
            unit_price_cents: l.unit_price_cents,
          })
          .collect(),
        subtotal_cents,
        shipping_fee_cents,
        commission_cents: apply_bps(subtotal_cents, settings.commission_rate_bps)?,
        transporter_fee_cents: apply_bps(subtotal_cents, settings.transporter_commission_rate_bps)?,
        total_cents: subtotal_cents
          .checked_add(shipping_fee_cents)
          .ok_or_else(|| total_too_large("order"))?,
      })
    })
    .collect::<DomainResult<Vec<OrderDraft>>>()?;

  let grand_total_cents = orders
    .iter()
    .try_fold(0i64, |acc, o| acc.checked_add(o.total_cents))
    .ok_or_else(|| total_too_large("checkout"))?;
  Ok(CheckoutPlan {
    buyer_id,
    orders,
    grand_total_cents,
  })
}
