// core/src/settings.rs

use crate::error::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};

pub const BPS_SCALE: i64 = 10_000;
/// Highest unit price a listing may carry.
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;
/// Highest value `max_cart_quantity` may be set to.
pub const MAX_CART_QUANTITY_LIMIT: i32 = 10_000;

/// Platform-wide knobs edited from the admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSettings {
  pub site_name: String,
  /// Platform cut of each order subtotal, in basis points.
  pub commission_rate_bps: i64,
  /// Transporter cut of each order subtotal, in basis points.
  pub transporter_commission_rate_bps: i64,
  pub flat_shipping_fee_cents: i64,
  /// Subtotal at which shipping becomes free. 0 never waives it.
  pub free_shipping_threshold_cents: i64,
  pub max_cart_quantity: i32,
  /// 0 means reviews stay editable forever.
  pub review_edit_window_days: u32,
  pub maintenance_mode: bool,
  pub allow_registrations: bool,
}

impl Default for PlatformSettings {
  fn default() -> Self {
    Self {
      site_name: "ADAZE".to_string(),
      commission_rate_bps: 1_000,
      transporter_commission_rate_bps: 500,
      flat_shipping_fee_cents: 500,
      free_shipping_threshold_cents: 50_000,
      max_cart_quantity: 99,
      review_edit_window_days: 30,
      maintenance_mode: false,
      allow_registrations: true,
    }
  }
}

impl PlatformSettings {
  pub fn validate(&self) -> DomainResult<()> {
    if self.site_name.trim().is_empty() {
      return Err(DomainError::Validation("site name cannot be empty".to_string()));
    }
    for (name, rate) in [
      ("commission_rate_bps", self.commission_rate_bps),
      ("transporter_commission_rate_bps", self.transporter_commission_rate_bps),
    ] {
      if !(0..=BPS_SCALE).contains(&rate) {
        return Err(DomainError::Validation(format!(
          "{} must be between 0 and {}",
          name, BPS_SCALE
        )));
      }
    }
    if self.commission_rate_bps + self.transporter_commission_rate_bps > BPS_SCALE {
      return Err(DomainError::Validation(
        "combined commission rates cannot exceed 100%".to_string(),
      ));
    }
    if self.flat_shipping_fee_cents < 0 || self.free_shipping_threshold_cents < 0 {
      return Err(DomainError::Validation("fees and thresholds cannot be negative".to_string()));
    }
    if !(1..=MAX_CART_QUANTITY_LIMIT).contains(&self.max_cart_quantity) {
      return Err(DomainError::Validation(format!(
        "max cart quantity must be between 1 and {}",
        MAX_CART_QUANTITY_LIMIT
      )));
    }
    Ok(())
  }

  /// Shipping fee for one order with the given subtotal.
  pub fn shipping_fee_for(&self, subtotal_cents: i64) -> i64 {
    if self.free_shipping_threshold_cents > 0 && subtotal_cents >= self.free_shipping_threshold_cents {
      0
    } else {
      self.flat_shipping_fee_cents
    }
  }
}

/// `amount * bps / 10_000`, rounded half up.
pub fn apply_bps(amount_cents: i64, bps: i64) -> DomainResult<i64> {
  let scaled = amount_cents
    .checked_mul(bps)
    .and_then(|v| v.checked_add(v.signum() * (BPS_SCALE / 2)))
    .ok_or_else(|| DomainError::Validation("amount is too large to apply a rate to".to_string()))?;
  Ok(scaled / BPS_SCALE)
}
