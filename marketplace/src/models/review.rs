// marketplace/src/models/review.rs

use adaze_core::review::{Rankable, ResponseState};
use adaze_core::Rating;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Review {
  pub id: Uuid,
  pub product_id: Uuid,
  pub user_id: Uuid,
  #[sqlx(try_from = "i16")]
  pub rating: Rating,
  pub title: Option<String>,
  pub comment: String,
  /// The reviewer had a delivered order containing the product when posting.
  pub verified_purchase: bool,
  pub helpful_count: i32,
  pub not_helpful_count: i32,
  pub trader_response: Option<String>,
  pub responded_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Review {
  pub fn response_state(&self) -> ResponseState {
    ResponseState::from_parts(self.trader_response.as_deref(), self.responded_at)
  }
}

impl Rankable for Review {
  fn rating(&self) -> Rating {
    self.rating
  }

  fn created_at(&self) -> DateTime<Utc> {
    self.created_at
  }

  fn helpful_count(&self) -> i32 {
    self.helpful_count
  }

  fn not_helpful_count(&self) -> i32 {
    self.not_helpful_count
  }
}

#[derive(Debug, Clone)]
pub struct NewReview {
  pub product_id: Uuid,
  pub user_id: Uuid,
  pub rating: Rating,
  pub title: Option<String>,
  pub comment: String,
  pub verified_purchase: bool,
}

/// Validated edit. `None` leaves a field unchanged; `title: Some(None)` clears the title.
#[derive(Debug, Clone, Default)]
pub struct ReviewEdit {
  pub rating: Option<Rating>,
  pub title: Option<Option<String>>,
  pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReviewVote {
  pub review_id: Uuid,
  pub user_id: Uuid,
  pub helpful: bool,
  pub created_at: DateTime<Utc>,
}
