// tests/review_tests.rs
mod common;

use adaze_core::review::{
  check_can_delete, check_can_edit, check_can_respond, check_can_review, check_can_vote, sort_reviews, validate_content,
  validate_response, vote_delta, Rankable, ResponseState, VoteDelta,
};
use adaze_core::{Actor, DomainError, Rating, RatingSummary, ReviewSort, Role, Vote};
use chrono::{DateTime, Duration, Utc};
use common::at;
use uuid::Uuid;

fn ratings(stars: &[i64]) -> Vec<Rating> {
  stars.iter().map(|s| Rating::new(*s).expect("valid rating")).collect()
}

#[test]
fn summary_rounds_average_to_one_decimal() {
  let summary = RatingSummary::from_ratings(ratings(&[5, 4, 4]));
  assert_eq!(summary.total, 3);
  assert_eq!(summary.average, 4.3);
  assert_eq!(summary.breakdown, [0, 0, 0, 2, 1]);
  assert_eq!(summary.percent(4), 67);
  assert_eq!(summary.percent(1), 0);
}

#[test]
fn empty_summary_is_zero() {
  let summary = RatingSummary::from_ratings(Vec::new());
  assert_eq!(summary, RatingSummary::default());
  assert_eq!(summary.average, 0.0);
  assert_eq!(summary.percent(5), 0);
}

#[test]
fn ratings_outside_one_to_five_are_rejected() {
  assert!(Rating::new(0).is_err());
  assert!(Rating::new(6).is_err());
  assert_eq!(Rating::new(3).map(Rating::stars), Ok(3));
  assert!(serde_json::from_str::<Rating>("9").is_err());
  assert_eq!(serde_json::from_str::<Rating>("2").map(Rating::stars).ok(), Some(2));
}

#[test]
fn content_is_trimmed_and_bounded() {
  let (title, comment) = validate_content(Some("  Solid  "), "   Works as described.  ").expect("valid content");
  assert_eq!(title.as_deref(), Some("Solid"));
  assert_eq!(comment, "Works as described.");

  let (title, _) = validate_content(Some("   "), "Long enough comment").expect("blank title is dropped");
  assert!(title.is_none());

  assert!(matches!(validate_content(None, "too short"), Err(DomainError::Validation(_))));
  let long_title = "t".repeat(121);
  assert!(validate_content(Some(&long_title), "Long enough comment").is_err());
  let long_comment = "c".repeat(2001);
  assert!(validate_content(None, &long_comment).is_err());
}

#[test]
fn sellers_cannot_review_their_own_products_and_nobody_twice() {
  let trader = Actor::new(Uuid::new_v4(), Role::Trader);
  let buyer = Actor::new(Uuid::new_v4(), Role::Buyer);
  let transporter = Actor::new(Uuid::new_v4(), Role::Transporter);

  assert!(matches!(
    check_can_review(&trader, trader.user_id, false),
    Err(DomainError::NotEligible(_))
  ));
  assert!(check_can_review(&buyer, trader.user_id, false).is_ok());
  assert!(check_can_review(&transporter, trader.user_id, false).is_ok());
  assert!(matches!(
    check_can_review(&buyer, trader.user_id, true),
    Err(DomainError::NotEligible(_))
  ));
}

#[test]
fn edits_are_limited_to_the_author_within_the_window() {
  let author = Actor::new(Uuid::new_v4(), Role::Buyer);
  let admin = Actor::new(Uuid::new_v4(), Role::Admin);
  let created = at(1, 12);

  assert!(check_can_edit(&author, author.user_id, created, created + Duration::days(29), 30).is_ok());
  assert!(matches!(
    check_can_edit(&author, author.user_id, created, created + Duration::days(31), 30),
    Err(DomainError::Forbidden(_))
  ));
  assert!(check_can_edit(&author, author.user_id, created, created + Duration::days(400), 0).is_ok());
  assert!(check_can_edit(&admin, author.user_id, created, created, 30).is_err());
}

#[test]
fn delete_and_respond_permissions() {
  let author = Actor::new(Uuid::new_v4(), Role::Buyer);
  let admin = Actor::new(Uuid::new_v4(), Role::Admin);
  let trader = Actor::new(Uuid::new_v4(), Role::Trader);
  let other_trader = Actor::new(Uuid::new_v4(), Role::Trader);

  assert!(check_can_delete(&author, author.user_id).is_ok());
  assert!(check_can_delete(&admin, author.user_id).is_ok());
  assert!(check_can_delete(&trader, author.user_id).is_err());

  assert!(check_can_respond(&trader, trader.user_id).is_ok());
  assert!(check_can_respond(&admin, trader.user_id).is_ok());
  assert!(check_can_respond(&other_trader, trader.user_id).is_err());
}

#[test]
fn responses_can_be_cleared() {
  assert_eq!(validate_response(Some("  Thanks! ")), Ok(Some("Thanks!".to_string())));
  assert_eq!(validate_response(Some("   ")), Ok(None));
  assert_eq!(validate_response(None), Ok(None));
  assert!(validate_response(Some(&"r".repeat(2001))).is_err());

  let now = at(2, 8);
  assert_eq!(ResponseState::from_parts(None, None), ResponseState::Awaiting);
  assert_eq!(
    ResponseState::from_parts(Some("Thanks"), Some(now)),
    ResponseState::Responded {
      body: "Thanks".to_string(),
      responded_at: now
    }
  );
}

#[test]
fn vote_deltas_move_one_count_at_a_time() {
  assert_eq!(vote_delta(None, Some(Vote::Helpful)), VoteDelta { helpful: 1, not_helpful: 0 });
  assert!(vote_delta(Some(Vote::Helpful), Some(Vote::Helpful)).is_noop());
  assert_eq!(
    vote_delta(Some(Vote::Helpful), Some(Vote::NotHelpful)),
    VoteDelta {
      helpful: -1,
      not_helpful: 1
    }
  );
  assert_eq!(vote_delta(Some(Vote::NotHelpful), None), VoteDelta { helpful: 0, not_helpful: -1 });
  assert!(vote_delta(None, None).is_noop());
  assert_eq!(Vote::from_flag(false), Vote::NotHelpful);
}

#[test]
fn authors_cannot_vote_on_their_own_review() {
  let author = Actor::new(Uuid::new_v4(), Role::Buyer);
  let reader = Actor::new(Uuid::new_v4(), Role::Buyer);
  assert!(check_can_vote(&author, author.user_id).is_err());
  assert!(check_can_vote(&reader, author.user_id).is_ok());
}

#[derive(Debug, Clone)]
struct Row {
  id: &'static str,
  rating: Rating,
  created_at: DateTime<Utc>,
  helpful: i32,
  not_helpful: i32,
}

impl Rankable for Row {
  fn rating(&self) -> Rating {
    self.rating
  }
  fn created_at(&self) -> DateTime<Utc> {
    self.created_at
  }
  fn helpful_count(&self) -> i32 {
    self.helpful
  }
  fn not_helpful_count(&self) -> i32 {
    self.not_helpful
  }
}

fn rows() -> Vec<Row> {
  let r = |s| Rating::new(s).expect("valid rating");
  vec![
    Row { id: "a", rating: r(3), created_at: at(1, 0), helpful: 4, not_helpful: 0 },
    Row { id: "b", rating: r(5), created_at: at(2, 0), helpful: 6, not_helpful: 2 },
    Row { id: "c", rating: r(5), created_at: at(3, 0), helpful: 1, not_helpful: 0 },
    Row { id: "d", rating: r(1), created_at: at(4, 0), helpful: 0, not_helpful: 3 },
  ]
}

fn order_of(sort: ReviewSort) -> Vec<&'static str> {
  let mut list = rows();
  sort_reviews(&mut list, sort);
  list.into_iter().map(|r| r.id).collect()
}

#[test]
fn sorting_modes() {
  assert_eq!(order_of(ReviewSort::Newest), vec!["d", "c", "b", "a"]);
  assert_eq!(order_of(ReviewSort::Oldest), vec!["a", "b", "c", "d"]);
  assert_eq!(order_of(ReviewSort::Highest), vec!["c", "b", "a", "d"]);
  assert_eq!(order_of(ReviewSort::Lowest), vec!["d", "a", "c", "b"]);
  // a and b both score 4; b has more helpful votes.
  assert_eq!(order_of(ReviewSort::MostHelpful), vec!["b", "a", "c", "d"]);

  assert_eq!("most_helpful".parse::<ReviewSort>(), Ok(ReviewSort::MostHelpful));
  assert_eq!(ReviewSort::default(), ReviewSort::Newest);
  assert!("random".parse::<ReviewSort>().is_err());
}
