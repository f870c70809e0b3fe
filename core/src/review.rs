// core/src/review.rs

//! Rating aggregation and the rules around writing, editing and voting on reviews.

use crate::error::{DomainError, DomainResult};
use crate::role::Actor;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use uuid::Uuid;

pub const MIN_COMMENT_LEN: usize = 10;
pub const MAX_COMMENT_LEN: usize = 2000;
pub const MAX_TITLE_LEN: usize = 120;
pub const MAX_RESPONSE_LEN: usize = 2000;

/// A star rating, 1 to 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub struct Rating(u8);

impl Rating {
  pub fn new(stars: i64) -> DomainResult<Self> {
    if (1..=5).contains(&stars) {
      Ok(Rating(stars as u8))
    } else {
      Err(DomainError::Validation(format!("rating must be between 1 and 5, got {}", stars)))
    }
  }

  pub fn stars(self) -> u8 {
    self.0
  }
}

impl TryFrom<i16> for Rating {
  type Error = DomainError;

  fn try_from(value: i16) -> Result<Self, Self::Error> {
    Rating::new(i64::from(value))
  }
}

impl From<Rating> for i16 {
  fn from(rating: Rating) -> Self {
    i16::from(rating.0)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
  /// Mean rating rounded to one decimal, 0.0 when there are no reviews.
  pub average: f64,
  pub total: u32,
  /// `breakdown[i]` counts reviews with `i + 1` stars.
  pub breakdown: [u32; 5],
}

impl Default for RatingSummary {
  fn default() -> Self {
    Self {
      average: 0.0,
      total: 0,
      breakdown: [0; 5],
    }
  }
}

impl RatingSummary {
  pub fn from_ratings<I>(ratings: I) -> Self
  where
    I: IntoIterator<Item = Rating>,
  {
    let mut breakdown = [0u32; 5];
    let mut sum: u64 = 0;
    let mut total: u32 = 0;
    for rating in ratings {
      breakdown[usize::from(rating.stars() - 1)] += 1;
      sum += u64::from(rating.stars());
      total += 1;
    }
    let average = if total == 0 {
      0.0
    } else {
      ((sum as f64 / f64::from(total)) * 10.0).round() / 10.0
    };
    Self {
      average,
      total,
      breakdown,
    }
  }

  /// Share of reviews at `stars`, as a percentage rounded to a whole number.
  pub fn percent(&self, stars: u8) -> u32 {
    if self.total == 0 || !(1..=5).contains(&stars) {
      return 0;
    }
    let count = self.breakdown[usize::from(stars - 1)];
    ((f64::from(count) * 100.0) / f64::from(self.total)).round() as u32
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSort {
  #[default]
  Newest,
  Oldest,
  Highest,
  Lowest,
  MostHelpful,
}

impl FromStr for ReviewSort {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "newest" | "recent" => Ok(ReviewSort::Newest),
      "oldest" => Ok(ReviewSort::Oldest),
      "highest" => Ok(ReviewSort::Highest),
      "lowest" => Ok(ReviewSort::Lowest),
      "most_helpful" | "helpful" => Ok(ReviewSort::MostHelpful),
      other => Err(DomainError::Validation(format!("unknown review sort '{}'", other))),
    }
  }
}

/// The parts of a review that ordering looks at.
pub trait Rankable {
  fn rating(&self) -> Rating;
  fn created_at(&self) -> DateTime<Utc>;
  fn helpful_count(&self) -> i32;
  fn not_helpful_count(&self) -> i32;
}

pub fn sort_reviews<R: Rankable>(reviews: &mut [R], sort: ReviewSort) {
  let newest_first = |a: &R, b: &R| b.created_at().cmp(&a.created_at());
  reviews.sort_by(|a, b| match sort {
    ReviewSort::Newest => newest_first(a, b),
    ReviewSort::Oldest => a.created_at().cmp(&b.created_at()),
    ReviewSort::Highest => b.rating().cmp(&a.rating()).then_with(|| newest_first(a, b)),
    ReviewSort::Lowest => a.rating().cmp(&b.rating()).then_with(|| newest_first(a, b)),
    ReviewSort::MostHelpful => {
      let score = |r: &R| r.helpful_count() - r.not_helpful_count();
      match score(b).cmp(&score(a)) {
        Ordering::Equal => b
          .helpful_count()
          .cmp(&a.helpful_count())
          .then_with(|| newest_first(a, b)),
        other => other,
      }
    }
  });
}

/// Trims and checks the free-text parts of a review.
pub fn validate_content(title: Option<&str>, comment: &str) -> DomainResult<(Option<String>, String)> {
  let comment = comment.trim();
  let comment_len = comment.chars().count();
  if comment_len < MIN_COMMENT_LEN {
    return Err(DomainError::Validation(format!(
      "review comment must be at least {} characters",
      MIN_COMMENT_LEN
    )));
  }
  if comment_len > MAX_COMMENT_LEN {
    return Err(DomainError::Validation(format!(
      "review comment must be at most {} characters",
      MAX_COMMENT_LEN
    )));
  }
  let title = match title.map(str::trim) {
    Some("") | None => None,
    Some(t) if t.chars().count() > MAX_TITLE_LEN => {
      return Err(DomainError::Validation(format!(
        "review title must be at most {} characters",
        MAX_TITLE_LEN
      )))
    }
    Some(t) => Some(t.to_string()),
  };
  Ok((title, comment.to_string()))
}

/// Anyone but the product's own seller may review it, once.
///
/// A purchase is not required; callers record it as `verified_purchase` instead.
pub fn check_can_review(reviewer: &Actor, product_trader_id: Uuid, already_reviewed: bool) -> DomainResult<()> {
  if reviewer.user_id == product_trader_id {
    return Err(DomainError::NotEligible("sellers cannot review their own products".to_string()));
  }
  if already_reviewed {
    return Err(DomainError::NotEligible("you have already reviewed this product".to_string()));
  }
  Ok(())
}

/// Only the author edits, and only inside the edit window. A window of 0 days never closes.
pub fn check_can_edit(
  actor: &Actor,
  author_id: Uuid,
  created_at: DateTime<Utc>,
  now: DateTime<Utc>,
  window_days: u32,
) -> DomainResult<()> {
  if actor.user_id != author_id {
    return Err(DomainError::Forbidden("only the author can edit a review".to_string()));
  }
  if window_days > 0 && now - created_at > Duration::days(i64::from(window_days)) {
    return Err(DomainError::Forbidden(format!(
      "reviews can only be edited within {} days of posting",
      window_days
    )));
  }
  Ok(())
}

pub fn check_can_delete(actor: &Actor, author_id: Uuid) -> DomainResult<()> {
  if actor.is_admin() || actor.user_id == author_id {
    Ok(())
  } else {
    Err(DomainError::Forbidden("only the author or an admin can delete a review".to_string()))
  }
}

pub fn check_can_respond(actor: &Actor, product_trader_id: Uuid) -> DomainResult<()> {
  if actor.is_admin() || actor.user_id == product_trader_id {
    Ok(())
  } else {
    Err(DomainError::Forbidden(
      "only the seller of this product can respond to its reviews".to_string(),
    ))
  }
}

/// Normalizes a seller response; `None` or blank clears it.
pub fn validate_response(body: Option<&str>) -> DomainResult<Option<String>> {
  match body.map(str::trim) {
    None | Some("") => Ok(None),
    Some(b) if b.chars().count() > MAX_RESPONSE_LEN => Err(DomainError::Validation(format!(
      "response must be at most {} characters",
      MAX_RESPONSE_LEN
    ))),
    Some(b) => Ok(Some(b.to_string())),
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResponseState {
  Awaiting,
  Responded { body: String, responded_at: DateTime<Utc> },
}

impl ResponseState {
  pub fn from_parts(body: Option<&str>, responded_at: Option<DateTime<Utc>>) -> Self {
    match (body, responded_at) {
      (Some(body), Some(at)) => ResponseState::Responded {
        body: body.to_string(),
        responded_at: at,
      },
      _ => ResponseState::Awaiting,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vote {
  Helpful,
  NotHelpful,
}

impl Vote {
  pub fn from_flag(helpful: bool) -> Self {
    if helpful {
      Vote::Helpful
    } else {
      Vote::NotHelpful
    }
  }

  pub fn is_helpful(self) -> bool {
    self == Vote::Helpful
  }
}

/// Change to a review's counters when a user's vote goes from `previous` to `next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteDelta {
  pub helpful: i32,
  pub not_helpful: i32,
}

impl VoteDelta {
  pub fn is_noop(&self) -> bool {
    self.helpful == 0 && self.not_helpful == 0
  }
}

pub fn vote_delta(previous: Option<Vote>, next: Option<Vote>) -> VoteDelta {
  let weight = |vote: Option<Vote>| match vote {
    Some(Vote::Helpful) => (1, 0),
    Some(Vote::NotHelpful) => (0, 1),
    None => (0, 0),
  };
  let (ph, pn) = weight(previous);
  let (nh, nn) = weight(next);
  VoteDelta {
    helpful: nh - ph,
    not_helpful: nn - pn,
  }
}

pub fn check_can_vote(voter: &Actor, author_id: Uuid) -> DomainResult<()> {
  if voter.user_id == author_id {
    Err(DomainError::Forbidden("you cannot vote on your own review".to_string()))
  } else {
    Ok(())
  }
}
