// core/examples/review_registry.rs

//! Registers a review-gating flow by state type and runs it for a few
//! reviewers, then aggregates the accepted ratings.
//!
//! Run with `cargo run -p adaze-core --example review_registry`.

use adaze_core::review::{check_can_review, validate_content};
use adaze_core::{Actor, FlowControl, FlowError, FlowOutcome, FlowRegistry, FlowState, Rating, RatingSummary, Role};
use adaze_core::Flow;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Submission {
  reviewer: Actor,
  trader_id: Uuid,
  stars: i64,
  comment: String,
  accepted: Option<Rating>,
}

fn review_flow() -> Flow<Submission, FlowError> {
  let mut flow = Flow::new(&[("eligibility", false), ("content", false), ("accept", false)]);
  flow.on("eligibility", |state: FlowState<Submission>| async move {
    let guard = state.read();
    if let Err(err) = check_can_review(&guard.reviewer, guard.trader_id, false) {
      warn!(error = %err, "Reviewer not eligible.");
      return Ok::<_, FlowError>(FlowControl::Halt);
    }
    Ok(FlowControl::Continue)
  });
  flow.on("content", |state: FlowState<Submission>| async move {
    let guard = state.read();
    if let Err(err) = validate_content(None, &guard.comment) {
      warn!(error = %err, "Review content rejected.");
      return Ok::<_, FlowError>(FlowControl::Halt);
    }
    Ok(FlowControl::Continue)
  });
  flow.on("accept", |state: FlowState<Submission>| async move {
    let mut guard = state.write();
    guard.accepted = Rating::new(guard.stars).ok();
    Ok::<_, FlowError>(if guard.accepted.is_some() { FlowControl::Continue } else { FlowControl::Halt })
  });
  flow
}

#[tokio::main]
async fn main() -> Result<(), FlowError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  let registry = FlowRegistry::<FlowError>::new();
  registry.register(review_flow());
  info!(stages = ?registry.stages_of::<Submission>(), "Review flow registered.");

  let trader_id = Uuid::new_v4();
  let submissions = [
    (Actor::new(Uuid::new_v4(), Role::Buyer), 5, "Arrived fresh and well packed."),
    (Actor::new(Uuid::new_v4(), Role::Wholesaler), 3, "Fine for resale, nothing more."),
    (Actor::new(trader_id, Role::Trader), 5, "My own product is the best."),
    (Actor::new(Uuid::new_v4(), Role::Buyer), 4, "Too short"),
    (Actor::new(Uuid::new_v4(), Role::Buyer), 9, "Nine stars would be generous."),
  ];

  let mut accepted = Vec::new();
  for (reviewer, stars, comment) in submissions {
    let state = FlowState::new(Submission {
      reviewer,
      trader_id,
      stars,
      comment: comment.to_string(),
      accepted: None,
    });
    let outcome = registry.run(state.clone()).await?;
    if outcome == FlowOutcome::Completed {
      accepted.extend(state.read().accepted);
    }
    info!(role = %reviewer.role, ?outcome, "Submission processed.");
  }

  let summary = RatingSummary::from_ratings(accepted);
  info!(average = summary.average, total = summary.total, "Ratings aggregated.");
  Ok(())
}
