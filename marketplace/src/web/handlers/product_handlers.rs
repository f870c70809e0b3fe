// marketplace/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use adaze_core::RatingSummary;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{NewProduct, Product, ProductFilter, ProductUpdate};
use crate::state::AppState;
use crate::web::AuthenticatedUser;

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ProductFilter>,
) -> Result<HttpResponse> {
  let filter = query.into_inner();
  if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
    if min > max {
      return Err(AppError::Validation("min_price cannot exceed max_price.".to_string()));
    }
  }
  let products = app_state.store.list_products(&filter).await?;
  Ok(HttpResponse::Ok().json(products))
}

/// Archived products are only visible to their seller and admins.
#[instrument(name = "handler::get_product", skip(app_state, viewer))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  viewer: Option<AuthenticatedUser>,
) -> Result<HttpResponse> {
  let product_id = path.into_inner();
  let product = app_state
    .store
    .product(product_id)
    .await?
    .filter(|p| p.active || viewer.as_ref().is_some_and(|v| v.actor.is_admin() || v.actor.user_id == p.trader_id))
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;
  let reviews = app_state.store.reviews_for_product(product_id).await?;
  let rating = RatingSummary::from_ratings(reviews.iter().map(|r| r.rating));
  Ok(HttpResponse::Ok().json(json!({ "product": product, "rating": rating })))
}

#[instrument(name = "handler::create_product", skip_all, fields(user_id = %user.actor.user_id))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  payload: web::Json<NewProduct>,
) -> Result<HttpResponse> {
  user.require_seller()?;
  let new = NewProduct {
    trader_id: user.actor.user_id,
    ..payload.into_inner()
  };
  new.validate()?;
  let product = app_state.store.create_product(new).await?;
  info!(product_id = %product.id, "Product listed.");
  Ok(HttpResponse::Created().json(product))
}

async fn owned_product(app_state: &AppState, user: &AuthenticatedUser, product_id: Uuid) -> Result<Product> {
  let product = app_state
    .store
    .product(product_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;
  if product.trader_id != user.actor.user_id && !user.actor.is_admin() {
    return Err(AppError::Forbidden("You can only manage your own products.".to_string()));
  }
  Ok(product)
}

#[instrument(name = "handler::update_product", skip_all, fields(user_id = %user.actor.user_id))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<ProductUpdate>,
) -> Result<HttpResponse> {
  let product = owned_product(&app_state, &user, path.into_inner()).await?;
  let update = payload.into_inner();
  update.validate()?;
  let product = app_state.store.update_product(product.id, update).await?;
  Ok(HttpResponse::Ok().json(product))
}

/// Products are archived rather than deleted so past orders keep their references.
#[instrument(name = "handler::archive_product", skip_all, fields(user_id = %user.actor.user_id))]
pub async fn archive_product_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let product = owned_product(&app_state, &user, path.into_inner()).await?;
  let archived = app_state
    .store
    .update_product(
      product.id,
      ProductUpdate {
        active: Some(false),
        ..ProductUpdate::default()
      },
    )
    .await?;
  info!(product_id = %archived.id, "Product archived.");
  Ok(HttpResponse::Ok().json(archived))
}
