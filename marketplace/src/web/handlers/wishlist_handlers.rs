// marketplace/src/web/handlers/wishlist_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::state::AppState;
use crate::web::AuthenticatedUser;

pub async fn view_wishlist_handler(app_state: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse> {
  let items = app_state.store.wishlist(user.actor.user_id).await?;
  Ok(HttpResponse::Ok().json(items))
}

#[instrument(name = "handler::add_to_wishlist", skip(app_state, user), fields(user_id = %user.actor.user_id))]
pub async fn add_to_wishlist_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let product_id = path.into_inner();
  app_state
    .store
    .product(product_id)
    .await?
    .filter(|p| p.active)
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;
  let item = app_state.store.add_to_wishlist(user.actor.user_id, product_id).await?;
  Ok(HttpResponse::Ok().json(item))
}

#[instrument(name = "handler::remove_from_wishlist", skip(app_state, user), fields(user_id = %user.actor.user_id))]
pub async fn remove_from_wishlist_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  if app_state.store.remove_from_wishlist(user.actor.user_id, path.into_inner()).await? {
    Ok(HttpResponse::NoContent().finish())
  } else {
    Err(AppError::NotFound("That product is not on your wishlist.".to_string()))
  }
}
