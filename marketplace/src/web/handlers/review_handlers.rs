// marketplace/src/web/handlers/review_handlers.rs

use actix_web::{web, HttpResponse};
use adaze_core::review::{
  check_can_delete, check_can_edit, check_can_respond, check_can_review, check_can_vote, sort_reviews,
  validate_content, validate_response,
};
use adaze_core::{FlowState, Rating, RatingSummary, ReviewSort, Vote};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::events::{MarketEvent, MarketEventKind};
use crate::models::{Product, Review, ReviewEdit};
use crate::pipelines::contexts::ReviewSubmissionState;
use crate::state::AppState;
use crate::web::handlers::run_flow;
use crate::web::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct ReviewListQuery {
  pub sort: Option<String>,
  /// Only reviews with exactly this many stars.
  pub rating: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewPayload {
  pub rating: i64,
  pub title: Option<String>,
  pub comment: String,
}

/// Absent fields stay as they are. An empty title clears it.
#[derive(Debug, Deserialize)]
pub struct ReviewEditPayload {
  pub rating: Option<i64>,
  pub title: Option<String>,
  pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VotePayload {
  /// `null` retracts an earlier vote.
  pub vote: Option<Vote>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePayload {
  /// `null` or blank clears the response.
  pub body: Option<String>,
}

async fn load_product(app_state: &AppState, product_id: Uuid) -> Result<Product> {
  app_state
    .store
    .product(product_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))
}

async fn load_review(app_state: &AppState, review_id: Uuid) -> Result<Review> {
  app_state
    .store
    .review(review_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Review {} not found", review_id)))
}

#[instrument(name = "handler::list_reviews", skip(app_state))]
pub async fn list_reviews_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  query: web::Query<ReviewListQuery>,
) -> Result<HttpResponse> {
  let product_id = path.into_inner();
  load_product(&app_state, product_id).await?;
  let sort: ReviewSort = match query.sort.as_deref() {
    Some(raw) => raw.parse()?,
    None => ReviewSort::default(),
  };
  let star_filter = query.rating.map(Rating::new).transpose()?;

  let mut reviews = app_state.store.reviews_for_product(product_id).await?;
  let summary = RatingSummary::from_ratings(reviews.iter().map(|r| r.rating));
  if let Some(stars) = star_filter {
    reviews.retain(|r| r.rating == stars);
  }
  sort_reviews(&mut reviews, sort);
  Ok(HttpResponse::Ok().json(json!({ "summary": summary, "reviews": reviews })))
}

#[instrument(name = "handler::submit_review", skip(app_state, user, payload), fields(user_id = %user.actor.user_id))]
pub async fn submit_review_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<ReviewPayload>,
) -> Result<HttpResponse> {
  let payload = payload.into_inner();
  let state = FlowState::new(ReviewSubmissionState {
    app: app_state.get_ref().clone(),
    actor: user.actor,
    product_id: path.into_inner(),
    rating: payload.rating,
    title: payload.title,
    comment: payload.comment,
    validated: None,
    product: None,
    verified_purchase: false,
    review: None,
  });
  run_flow(&app_state, state.clone(), "Review submission").await?;

  let review = state
    .write()
    .review
    .take()
    .ok_or_else(|| AppError::Internal("Review flow completed without a review.".to_string()))?;
  Ok(HttpResponse::Created().json(review))
}

#[instrument(name = "handler::review_eligibility", skip(app_state, user), fields(user_id = %user.actor.user_id))]
pub async fn review_eligibility_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let product = load_product(&app_state, path.into_inner()).await?;
  let already_reviewed = app_state.store.has_reviewed(user.actor.user_id, product.id).await?;
  let verified_purchase = app_state.store.has_purchased(user.actor.user_id, product.id).await?;
  let verdict = check_can_review(&user.actor, product.trader_id, already_reviewed);
  Ok(HttpResponse::Ok().json(json!({
    "eligible": verdict.is_ok(),
    "reason": verdict.err().map(|e| e.to_string()),
    "already_reviewed": already_reviewed,
    "verified_purchase": verified_purchase,
  })))
}

#[instrument(name = "handler::edit_review", skip(app_state, user, payload), fields(user_id = %user.actor.user_id))]
pub async fn edit_review_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<ReviewEditPayload>,
) -> Result<HttpResponse> {
  let review = load_review(&app_state, path.into_inner()).await?;
  let settings = app_state.store.settings().await?;
  check_can_edit(
    &user.actor,
    review.user_id,
    review.created_at,
    Utc::now(),
    settings.review_edit_window_days,
  )?;

  let payload = payload.into_inner();
  let rating = payload.rating.map(Rating::new).transpose()?;
  let merged_title = match &payload.title {
    Some(title) => Some(title.as_str()),
    None => review.title.as_deref(),
  };
  let merged_comment = payload.comment.as_deref().unwrap_or(&review.comment);
  let (title, comment) = validate_content(merged_title, merged_comment)?;

  let edit = ReviewEdit {
    rating,
    title: payload.title.is_some().then_some(title),
    comment: payload.comment.is_some().then_some(comment),
  };
  let updated = app_state.store.update_review(review.id, edit).await?;
  info!(review_id = %updated.id, "Review edited.");
  Ok(HttpResponse::Ok().json(updated))
}

#[instrument(name = "handler::delete_review", skip(app_state, user), fields(user_id = %user.actor.user_id))]
pub async fn delete_review_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let review = load_review(&app_state, path.into_inner()).await?;
  check_can_delete(&user.actor, review.user_id)?;
  app_state.store.delete_review(review.id).await?;
  info!(review_id = %review.id, "Review deleted.");
  Ok(HttpResponse::NoContent().finish())
}

#[instrument(name = "handler::vote_review", skip(app_state, user, payload), fields(user_id = %user.actor.user_id))]
pub async fn vote_review_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<VotePayload>,
) -> Result<HttpResponse> {
  let review = load_review(&app_state, path.into_inner()).await?;
  check_can_vote(&user.actor, review.user_id)?;
  let updated = app_state
    .store
    .cast_vote(review.id, user.actor.user_id, payload.into_inner().vote)
    .await?;
  Ok(HttpResponse::Ok().json(updated))
}

#[instrument(name = "handler::respond_to_review", skip(app_state, user, payload), fields(user_id = %user.actor.user_id))]
pub async fn respond_to_review_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  path: web::Path<Uuid>,
  payload: web::Json<ResponsePayload>,
) -> Result<HttpResponse> {
  let review = load_review(&app_state, path.into_inner()).await?;
  let product = load_product(&app_state, review.product_id).await?;
  check_can_respond(&user.actor, product.trader_id)?;

  let body = validate_response(payload.body.as_deref())?;
  let responded_at = body.as_ref().map(|_| Utc::now());
  let responding = body.is_some();
  let updated = app_state.store.set_review_response(review.id, body, responded_at).await?;

  if responding {
    app_state.events.publish(MarketEvent::new(
      MarketEventKind::ReviewResponded {
        review_id: updated.id,
        product_id: updated.product_id,
      },
      [updated.user_id],
    ));
  }
  Ok(HttpResponse::Ok().json(json!({
    "review": updated,
    "response": updated.response_state(),
  })))
}
