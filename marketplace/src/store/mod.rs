// marketplace/src/store/mod.rs

//! The `MarketStore` seam over the hosted data platform.
//!
//! Handlers and flows only talk to `Arc<dyn MarketStore>`. `MemoryStore` backs
//! tests and database-less runs; `PgStore` backs production.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::errors::Result;
use crate::models::{
  CartItem, NewProduct, NewProfile, NewReview, Order, OrderFilter, OrderWithItems, Product,
  ProductFilter, ProductUpdate, Profile, ProfileAdminUpdate, ProfileUpdate, Review, ReviewEdit, Session, WishlistItem,
};
use adaze_core::analytics::OrderFact;
use adaze_core::checkout::{CartLine, CheckoutPlan};
use adaze_core::{OrderStatus, PlatformSettings, Vote};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait MarketStore: Send + Sync {
  // --- profiles ---

  /// Fails with `Conflict` when the email is taken (case-insensitive).
  async fn create_profile(&self, new: NewProfile) -> Result<Profile>;
  async fn profile(&self, id: Uuid) -> Result<Option<Profile>>;
  async fn profile_by_email(&self, email: &str) -> Result<Option<Profile>>;
  async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Profile>;
  async fn admin_update_profile(&self, id: Uuid, update: ProfileAdminUpdate) -> Result<Profile>;
  async fn list_profiles(&self) -> Result<Vec<Profile>>;

  // --- sessions ---

  async fn create_session(&self, session: Session) -> Result<()>;
  async fn session(&self, token: &str) -> Result<Option<Session>>;
  async fn delete_session(&self, token: &str) -> Result<bool>;
  /// Sessions that have not expired at `now`, newest first.
  async fn live_sessions(&self, now: DateTime<Utc>) -> Result<Vec<Session>>;

  // --- products ---

  async fn create_product(&self, new: NewProduct) -> Result<Product>;
  async fn product(&self, id: Uuid) -> Result<Option<Product>>;
  async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>>;
  async fn update_product(&self, id: Uuid, update: ProductUpdate) -> Result<Product>;

  // --- cart & wishlist ---

  async fn cart_items(&self, user_id: Uuid) -> Result<Vec<CartItem>>;
  /// Cart rows joined with their products, oldest first.
  async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>>;
  /// Adds `quantity` to the existing row or creates one.
  async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem>;
  async fn set_cart_quantity(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<Option<CartItem>>;
  async fn remove_from_cart(&self, user_id: Uuid, product_id: Uuid) -> Result<bool>;
  async fn wishlist(&self, user_id: Uuid) -> Result<Vec<WishlistItem>>;
  /// Idempotent: adding twice returns the existing row.
  async fn add_to_wishlist(&self, user_id: Uuid, product_id: Uuid) -> Result<WishlistItem>;
  async fn remove_from_wishlist(&self, user_id: Uuid, product_id: Uuid) -> Result<bool>;

  // --- orders ---

  /// Writes every draft of `plan` in one unit: stock is decremented, orders and
  /// items inserted and the buyer's cart cleared. Any shortfall aborts it all.
  async fn place_orders(&self, plan: &CheckoutPlan, shipping_address: Option<String>) -> Result<Vec<OrderWithItems>>;
  async fn order(&self, id: Uuid) -> Result<Option<OrderWithItems>>;
  /// Newest first.
  async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>>;
  /// Compare-and-set on `expected`. With `restock`, item quantities go back to stock in the same unit.
  async fn transition_order(&self, id: Uuid, expected: OrderStatus, next: OrderStatus, restock: bool) -> Result<Order>;
  /// Assigns `transporter_id` only if the order is confirmed and unassigned.
  async fn claim_order(&self, id: Uuid, transporter_id: Uuid) -> Result<Order>;
  async fn order_facts(&self) -> Result<Vec<OrderFact>>;
  /// True when `user_id` has a delivered order containing `product_id`.
  async fn has_purchased(&self, user_id: Uuid, product_id: Uuid) -> Result<bool>;

  // --- reviews ---

  /// Fails with `Conflict` when the user already reviewed the product.
  async fn create_review(&self, new: NewReview) -> Result<Review>;
  async fn review(&self, id: Uuid) -> Result<Option<Review>>;
  async fn reviews_for_product(&self, product_id: Uuid) -> Result<Vec<Review>>;
  async fn has_reviewed(&self, user_id: Uuid, product_id: Uuid) -> Result<bool>;
  async fn update_review(&self, id: Uuid, edit: ReviewEdit) -> Result<Review>;
  async fn delete_review(&self, id: Uuid) -> Result<bool>;
  async fn set_review_response(&self, id: Uuid, body: Option<String>, at: Option<DateTime<Utc>>) -> Result<Review>;
  async fn vote(&self, review_id: Uuid, user_id: Uuid) -> Result<Option<Vote>>;
  /// Records (or retracts, with `None`) a vote and moves the review's counters in the same unit.
  async fn cast_vote(&self, review_id: Uuid, user_id: Uuid, vote: Option<Vote>) -> Result<Review>;

  // --- settings ---

  async fn settings(&self) -> Result<PlatformSettings>;
  async fn save_settings(&self, settings: &PlatformSettings) -> Result<()>;
}
