// tests/checkout_plan_tests.rs

use adaze_core::checkout::{plan_checkout, validate_quantity, CartLine};
use adaze_core::settings::{apply_bps, MAX_PRICE_CENTS};
use adaze_core::{DomainError, PlatformSettings};
use uuid::Uuid;

fn cart_line(trader_id: Uuid, name: &str, unit_price_cents: i64, quantity: i32, stock: i32) -> CartLine {
  CartLine {
    product_id: Uuid::new_v4(),
    trader_id,
    name: name.to_string(),
    unit_price_cents,
    quantity,
    stock_available: stock,
    active: true,
  }
}

#[test]
fn groups_lines_per_trader_in_first_appearance_order() {
  let buyer = Uuid::new_v4();
  let kofi = Uuid::new_v4();
  let esi = Uuid::new_v4();
  let lines = vec![
    cart_line(kofi, "Shea butter", 1_200, 2, 10),
    cart_line(esi, "Kente scarf", 8_000, 1, 3),
    cart_line(kofi, "Black soap", 450, 4, 40),
  ];

  let plan = plan_checkout(buyer, &lines, &PlatformSettings::default()).expect("valid cart");

  assert_eq!(plan.orders.len(), 2);
  assert_eq!(plan.orders[0].trader_id, kofi);
  assert_eq!(plan.orders[1].trader_id, esi);
  assert_eq!(plan.orders[0].lines.len(), 2);
  assert_eq!(plan.item_count(), 7);

  let kofi_order = &plan.orders[0];
  assert_eq!(kofi_order.subtotal_cents, 2_400 + 1_800);
  assert_eq!(kofi_order.shipping_fee_cents, 500);
  assert_eq!(kofi_order.commission_cents, 420);
  assert_eq!(kofi_order.transporter_fee_cents, 210);
  assert_eq!(kofi_order.total_cents, 4_700);

  assert_eq!(plan.grand_total_cents, 4_700 + 8_500);
}

#[test]
fn shipping_is_waived_at_the_threshold() {
  let buyer = Uuid::new_v4();
  let trader = Uuid::new_v4();
  let settings = PlatformSettings::default();
  let lines = vec![cart_line(trader, "Generator", 50_000, 1, 1)];

  let plan = plan_checkout(buyer, &lines, &settings).expect("valid cart");
  assert_eq!(plan.orders[0].shipping_fee_cents, 0);
  assert_eq!(plan.orders[0].total_cents, 50_000);

  let never_free = PlatformSettings {
    free_shipping_threshold_cents: 0,
    ..PlatformSettings::default()
  };
  let plan = plan_checkout(buyer, &lines, &never_free).expect("valid cart");
  assert_eq!(plan.orders[0].shipping_fee_cents, 500);
}

#[test]
fn rejects_empty_cart_and_bad_quantities() {
  let buyer = Uuid::new_v4();
  let trader = Uuid::new_v4();
  let settings = PlatformSettings::default();

  assert!(matches!(plan_checkout(buyer, &[], &settings), Err(DomainError::Validation(_))));
  let zero = vec![cart_line(trader, "Rice", 100, 0, 5)];
  assert!(matches!(plan_checkout(buyer, &zero, &settings), Err(DomainError::Validation(_))));

  assert!(validate_quantity(99, &settings).is_ok());
  assert!(validate_quantity(100, &settings).is_err());
  assert!(validate_quantity(-1, &settings).is_err());
}

#[test]
fn rejects_inactive_own_and_understocked_products() {
  let buyer = Uuid::new_v4();
  let trader = Uuid::new_v4();
  let settings = PlatformSettings::default();

  let mut archived = cart_line(trader, "Old stock", 100, 1, 5);
  archived.active = false;
  assert!(matches!(
    plan_checkout(buyer, &[archived], &settings),
    Err(DomainError::Validation(_))
  ));

  let own = cart_line(buyer, "My own mangoes", 100, 1, 5);
  assert!(matches!(plan_checkout(buyer, &[own], &settings), Err(DomainError::Forbidden(_))));

  let short = cart_line(trader, "Yam", 300, 6, 4);
  let short_id = short.product_id;
  assert_eq!(
    plan_checkout(buyer, &[short], &settings),
    Err(DomainError::InsufficientStock {
      product_id: short_id,
      available: 4,
      requested: 6
    })
  );
}

#[test]
fn basis_points_round_half_up() {
  assert_eq!(apply_bps(1_005, 1_000), Ok(101));
  assert_eq!(apply_bps(1_004, 1_000), Ok(100));
  assert_eq!(apply_bps(0, 1_000), Ok(0));
  assert_eq!(apply_bps(12_345, 10_000), Ok(12_345));
  assert_eq!(apply_bps(-1_005, 1_000), Ok(-101));
  assert!(matches!(apply_bps(i64::MAX / 2, 1_000), Err(DomainError::Validation(_))));
}

#[test]
fn oversized_prices_fail_instead_of_overflowing() {
  let settings = PlatformSettings::default();
  let buyer = Uuid::new_v4();
  let trader = Uuid::new_v4();

  let gold = cart_line(trader, "Gold bar", 100_000_000_000_000_000, 1, 1);
  assert!(matches!(plan_checkout(buyer, &[gold], &settings), Err(DomainError::Validation(_))));

  let bulk = cart_line(trader, "Bulk gold", i64::MAX / 2, 3, 5);
  assert!(matches!(bulk.line_total_cents(), Err(DomainError::Validation(_))));
  assert!(matches!(plan_checkout(buyer, &[bulk], &settings), Err(DomainError::Validation(_))));

  let capped = cart_line(trader, "Top listing", MAX_PRICE_CENTS, settings.max_cart_quantity, 100);
  let plan = plan_checkout(buyer, &[capped], &settings).expect("capped price fits");
  assert_eq!(plan.orders[0].subtotal_cents, MAX_PRICE_CENTS * 99);
}
