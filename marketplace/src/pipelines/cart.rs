// marketplace/src/pipelines/cart.rs

use crate::errors::AppError;
use crate::pipelines::contexts::AddToCartState;
use adaze_core::checkout::validate_quantity as check_quantity;
use adaze_core::{DomainError, Flow, FlowControl, FlowState};
use tracing::{debug, info, instrument};

pub fn build_add_to_cart_flow() -> Flow<AddToCartState, AppError> {
  let mut flow = Flow::new(&[
    ("validate_quantity", false),
    ("load_product", false),
    ("check_stock", false),
    ("upsert_cart_item", false),
  ]);
  flow.on("validate_quantity", validate_quantity);
  flow.on("load_product", load_product);
  flow.on("check_stock", check_stock);
  flow.on("upsert_cart_item", upsert_cart_item);
  flow
}

#[instrument(name = "cart::validate_quantity", skip_all)]
async fn validate_quantity(state: FlowState<AddToCartState>) -> Result<FlowControl, AppError> {
  let guard = state.read();
  check_quantity(guard.quantity, &guard.settings)?;
  Ok(FlowControl::Continue)
}

#[instrument(name = "cart::load_product", skip_all)]
async fn load_product(state: FlowState<AddToCartState>) -> Result<FlowControl, AppError> {
  let (store, user_id, product_id) = {
    let guard = state.read();
    (guard.app.store.clone(), guard.actor.user_id, guard.product_id)
  };
  let product = store
    .product(product_id)
    .await?
    .filter(|p| p.active)
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;
  if product.trader_id == user_id {
    return Err(AppError::Forbidden("You cannot add your own product to your cart.".to_string()));
  }
  let already_in_cart = store
    .cart_items(user_id)
    .await?
    .into_iter()
    .find(|item| item.product_id == product_id)
    .map_or(0, |item| item.quantity);

  let mut guard = state.write();
  guard.product = Some(product);
  guard.already_in_cart = already_in_cart;
  Ok(FlowControl::Continue)
}

/// The combined quantity must fit both the stock and the per-line cap.
#[instrument(name = "cart::check_stock", skip_all)]
async fn check_stock(state: FlowState<AddToCartState>) -> Result<FlowControl, AppError> {
  let guard = state.read();
  let product = guard
    .product
    .as_ref()
    .ok_or_else(|| AppError::Internal("Product missing before stock check.".to_string()))?;
  let wanted = guard.already_in_cart + guard.quantity;
  check_quantity(wanted, &guard.settings)?;
  if wanted > product.stock_quantity {
    return Err(
      DomainError::InsufficientStock {
        product_id: product.id,
        available: product.stock_quantity,
        requested: wanted,
      }
      .into(),
    );
  }
  debug!(product_id = %product.id, wanted, stock = product.stock_quantity, "Stock available.");
  Ok(FlowControl::Continue)
}

#[instrument(name = "cart::upsert_cart_item", skip_all)]
async fn upsert_cart_item(state: FlowState<AddToCartState>) -> Result<FlowControl, AppError> {
  let (store, user_id, product_id, quantity) = {
    let guard = state.read();
    (guard.app.store.clone(), guard.actor.user_id, guard.product_id, guard.quantity)
  };
  let item = store.add_to_cart(user_id, product_id, quantity).await?;
  info!(%user_id, %product_id, quantity = item.quantity, "Cart updated.");
  state.write().item = Some(item);
  Ok(FlowControl::Continue)
}
