// marketplace/src/pipelines/review.rs

use crate::errors::AppError;
use crate::events::{MarketEvent, MarketEventKind};
use crate::models::NewReview;
use crate::pipelines::contexts::ReviewSubmissionState;
use adaze_core::review::{check_can_review, validate_content as check_content};
use adaze_core::{Flow, FlowControl, FlowState, Rating};
use tracing::{debug, info, instrument};

pub fn build_review_flow() -> Flow<ReviewSubmissionState, AppError> {
  let mut flow = Flow::new(&[
    ("validate_content", false),
    ("load_product", false),
    ("check_eligibility", false),
    ("record_purchase_status", false),
    ("create_review", false),
    ("notify_seller", true),
  ]);
  flow.on("validate_content", validate_content);
  flow.on("load_product", load_product);
  flow.on("check_eligibility", check_eligibility);
  flow.on("record_purchase_status", record_purchase_status);
  flow.on("create_review", create_review);
  flow.on("notify_seller", notify_seller);
  flow
}

#[instrument(name = "review::validate_content", skip_all)]
async fn validate_content(state: FlowState<ReviewSubmissionState>) -> Result<FlowControl, AppError> {
  let mut guard = state.write();
  let rating = Rating::new(guard.rating)?;
  let (title, comment) = check_content(guard.title.as_deref(), &guard.comment)?;
  guard.validated = Some((rating, title, comment));
  Ok(FlowControl::Continue)
}

#[instrument(name = "review::load_product", skip_all)]
async fn load_product(state: FlowState<ReviewSubmissionState>) -> Result<FlowControl, AppError> {
  let (store, product_id) = {
    let guard = state.read();
    (guard.app.store.clone(), guard.product_id)
  };
  let product = store
    .product(product_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;
  state.write().product = Some(product);
  Ok(FlowControl::Continue)
}

#[instrument(name = "review::check_eligibility", skip_all)]
async fn check_eligibility(state: FlowState<ReviewSubmissionState>) -> Result<FlowControl, AppError> {
  let (store, actor, trader_id, product_id) = {
    let guard = state.read();
    let trader_id = guard
      .product
      .as_ref()
      .map(|p| p.trader_id)
      .ok_or_else(|| AppError::Internal("Product missing before eligibility check.".to_string()))?;
    (guard.app.store.clone(), guard.actor, trader_id, guard.product_id)
  };
  let already_reviewed = store.has_reviewed(actor.user_id, product_id).await?;
  check_can_review(&actor, trader_id, already_reviewed)?;
  Ok(FlowControl::Continue)
}

#[instrument(name = "review::record_purchase_status", skip_all)]
async fn record_purchase_status(state: FlowState<ReviewSubmissionState>) -> Result<FlowControl, AppError> {
  let (store, user_id, product_id) = {
    let guard = state.read();
    (guard.app.store.clone(), guard.actor.user_id, guard.product_id)
  };
  let verified = store.has_purchased(user_id, product_id).await?;
  debug!(%user_id, %product_id, verified, "Purchase status recorded.");
  state.write().verified_purchase = verified;
  Ok(FlowControl::Continue)
}

#[instrument(name = "review::create_review", skip_all)]
async fn create_review(state: FlowState<ReviewSubmissionState>) -> Result<FlowControl, AppError> {
  let (store, new_review) = {
    let guard = state.read();
    let (rating, title, comment) = guard
      .validated
      .clone()
      .ok_or_else(|| AppError::Internal("Review content not validated.".to_string()))?;
    (
      guard.app.store.clone(),
      NewReview {
        product_id: guard.product_id,
        user_id: guard.actor.user_id,
        rating,
        title,
        comment,
        verified_purchase: guard.verified_purchase,
      },
    )
  };
  let review = store.create_review(new_review).await?;
  info!(review_id = %review.id, product_id = %review.product_id, rating = review.rating.stars(), "Review posted.");
  state.write().review = Some(review);
  Ok(FlowControl::Continue)
}

#[instrument(name = "review::notify_seller", skip_all)]
async fn notify_seller(state: FlowState<ReviewSubmissionState>) -> Result<FlowControl, AppError> {
  let guard = state.read();
  if let (Some(review), Some(product)) = (&guard.review, &guard.product) {
    guard.app.events.publish(MarketEvent::new(
      MarketEventKind::ReviewPosted {
        review_id: review.id,
        product_id: product.id,
        rating: i16::from(review.rating),
      },
      [product.trader_id],
    ));
  }
  Ok(FlowControl::Continue)
}
