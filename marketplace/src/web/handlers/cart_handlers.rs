// marketplace/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use adaze_core::checkout::validate_quantity;
use adaze_core::{DomainError, FlowState};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::CartView;
use crate::pipelines::contexts::AddToCartState;
use crate::state::AppState;
use crate::web::handlers::run_flow;
use crate::web::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct AddToCartPayload {
  pub product_id: Uuid,
  #[serde(default = "one")]
  pub quantity: i32,
}

fn one() -> i32 {
  1
}

#[derive(Deserialize, Debug)]
pub struct SetQuantityPayload {
  pub quantity: i32,
}

#[instrument(name = "handler::view_cart", skip_all, fields(user_id = %user.actor.user_id))]
pub async fn view_cart_handler(app_state: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse> {
  let lines = app_state.store.cart_lines(user.actor.user_id).await?;
  Ok(HttpResponse::Ok().json(CartView::from_lines(lines)?))
}

#[instrument(name = "handler::add_to_cart", skip(app_state, user), fields(user_id = %user.actor.user_id))]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  payload: web::Json<AddToCartPayload>,
) -> Result<HttpResponse> {
  let settings = app_state.store.settings().await?;
  let state = FlowState::new(AddToCartState {
    app: app_state.get_ref().clone(),
    actor: user.actor,
    product_id: payload.product_id,
    quantity: payload.quantity,
    settings,
    product: None,
    already_in_cart: 0,
    item: None,
  });
  run_flow(&app_state, state.clone(), "Add to cart").await?;

  let item = state
    .write()
    .item
    .take()
    .ok_or_else(|| AppError::Internal("Add to cart completed without a cart item.".to_string()))?;
  Ok(HttpResponse::Ok().json(item))
}

#[instrument(name = "handler::set_cart_quantity", skip(app_state, user), fields(user_id = %user.actor.user_id))]
pub async fn set_quantity_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<SetQuantityPayload>,
) -> Result<HttpResponse> {
  let product_id = path.into_inner();
  let quantity = payload.quantity;
  let settings = app_state.store.settings().await?;
  validate_quantity(quantity, &settings)?;

  let product = app_state
    .store
    .product(product_id)
    .await?
    .filter(|p| p.active)
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;
  if quantity > product.stock_quantity {
    return Err(
      DomainError::InsufficientStock {
        product_id,
        available: product.stock_quantity,
        requested: quantity,
      }
      .into(),
    );
  }

  let item = app_state
    .store
    .set_cart_quantity(user.actor.user_id, product_id, quantity)
    .await?
    .ok_or_else(|| AppError::NotFound("That product is not in your cart.".to_string()))?;
  info!(%product_id, quantity, "Cart quantity set.");
  Ok(HttpResponse::Ok().json(item))
}

#[instrument(name = "handler::remove_from_cart", skip(app_state, user), fields(user_id = %user.actor.user_id))]
pub async fn remove_from_cart_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  if app_state.store.remove_from_cart(user.actor.user_id, path.into_inner()).await? {
    Ok(HttpResponse::NoContent().finish())
  } else {
    Err(AppError::NotFound("That product is not in your cart.".to_string()))
  }
}
