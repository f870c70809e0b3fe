// marketplace/src/store/memory.rs

//! In-process store. One `parking_lot::RwLock` over all tables gives every
//! method the same all-or-nothing behaviour a database transaction would.

use crate::errors::{AppError, Result};
use crate::models::product::sort_products;
use crate::models::{
  CartItem, NewProduct, NewProfile, NewReview, Order, OrderFilter, OrderItem, OrderWithItems, Product, ProductFilter,
  ProductUpdate, Profile, ProfileAdminUpdate, ProfileUpdate, Review, ReviewEdit, ReviewVote, Session, WishlistItem,
};
use crate::store::MarketStore;
use adaze_core::analytics::OrderFact;
use adaze_core::checkout::{CartLine, CheckoutPlan};
use adaze_core::review::vote_delta;
use adaze_core::{OrderStatus, PlatformSettings, Vote};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
  profiles: HashMap<Uuid, Profile>,
  sessions: HashMap<String, Session>,
  products: HashMap<Uuid, Product>,
  cart: Vec<CartItem>,
  wishlist: Vec<WishlistItem>,
  orders: HashMap<Uuid, Order>,
  order_items: Vec<OrderItem>,
  reviews: HashMap<Uuid, Review>,
  votes: HashMap<(Uuid, Uuid), ReviewVote>,
  settings: PlatformSettings,
}

impl Tables {
  fn with_items(&self, order: &Order) -> OrderWithItems {
    OrderWithItems {
      order: order.clone(),
      items: self.order_items.iter().filter(|i| i.order_id == order.id).cloned().collect(),
    }
  }
}

#[derive(Default)]
pub struct MemoryStore {
  tables: RwLock<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

fn not_found(what: &str, id: impl std::fmt::Display) -> AppError {
  AppError::NotFound(format!("{} {} not found", what, id))
}

#[async_trait]
impl MarketStore for MemoryStore {
  async fn create_profile(&self, new: NewProfile) -> Result<Profile> {
    let mut t = self.tables.write();
    if t.profiles.values().any(|p| p.email.eq_ignore_ascii_case(&new.email)) {
      return Err(AppError::Conflict("An account with this email already exists.".to_string()));
    }
    let now = Utc::now();
    let profile = Profile {
      id: Uuid::new_v4(),
      email: new.email,
      password_hash: new.password_hash,
      full_name: new.full_name,
      phone: new.phone,
      role: new.role,
      suspended: false,
      created_at: now,
      updated_at: now,
    };
    t.profiles.insert(profile.id, profile.clone());
    Ok(profile)
  }

  async fn profile(&self, id: Uuid) -> Result<Option<Profile>> {
    Ok(self.tables.read().profiles.get(&id).cloned())
  }

  async fn profile_by_email(&self, email: &str) -> Result<Option<Profile>> {
    Ok(
      self
        .tables
        .read()
        .profiles
        .values()
        .find(|p| p.email.eq_ignore_ascii_case(email))
        .cloned(),
    )
  }

  async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Profile> {
    let mut t = self.tables.write();
    let profile = t.profiles.get_mut(&id).ok_or_else(|| not_found("Profile", id))?;
    if let Some(name) = update.full_name {
      profile.full_name = name;
    }
    if let Some(phone) = update.phone {
      profile.phone = Some(phone).filter(|p| !p.trim().is_empty());
    }
    profile.updated_at = Utc::now();
    Ok(profile.clone())
  }

  async fn admin_update_profile(&self, id: Uuid, update: ProfileAdminUpdate) -> Result<Profile> {
    let mut t = self.tables.write();
    let profile = t.profiles.get_mut(&id).ok_or_else(|| not_found("Profile", id))?;
    if let Some(role) = update.role {
      profile.role = role;
    }
    if let Some(suspended) = update.suspended {
      profile.suspended = suspended;
    }
    profile.updated_at = Utc::now();
    Ok(profile.clone())
  }

  async fn list_profiles(&self) -> Result<Vec<Profile>> {
    let mut all: Vec<Profile> = self.tables.read().profiles.values().cloned().collect();
    all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(all)
  }

  async fn create_session(&self, session: Session) -> Result<()> {
    self.tables.write().sessions.insert(session.token.clone(), session);
    Ok(())
  }

  async fn session(&self, token: &str) -> Result<Option<Session>> {
    Ok(self.tables.read().sessions.get(token).cloned())
  }

  async fn delete_session(&self, token: &str) -> Result<bool> {
    Ok(self.tables.write().sessions.remove(token).is_some())
  }

  async fn live_sessions(&self, now: DateTime<Utc>) -> Result<Vec<Session>> {
    let mut live: Vec<Session> = self
      .tables
      .read()
      .sessions
      .values()
      .filter(|s| s.is_live(now))
      .cloned()
      .collect();
    live.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(live)
  }

  async fn create_product(&self, new: NewProduct) -> Result<Product> {
    let now = Utc::now();
    let product = Product {
      id: Uuid::new_v4(),
      trader_id: new.trader_id,
      name: new.name.trim().to_string(),
      description: new.description,
      category: new.category,
      price_cents: new.price_cents,
      stock_quantity: new.stock_quantity,
      image_url: new.image_url,
      active: true,
      created_at: now,
      updated_at: now,
    };
    self.tables.write().products.insert(product.id, product.clone());
    Ok(product)
  }

  async fn product(&self, id: Uuid) -> Result<Option<Product>> {
    Ok(self.tables.read().products.get(&id).cloned())
  }

  async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
    let mut found: Vec<Product> = self
      .tables
      .read()
      .products
      .values()
      .filter(|p| filter.matches(p))
      .cloned()
      .collect();
    sort_products(&mut found, filter.sort);
    Ok(found)
  }

  async fn update_product(&self, id: Uuid, update: ProductUpdate) -> Result<Product> {
    let mut t = self.tables.write();
    let product = t.products.get_mut(&id).ok_or_else(|| not_found("Product", id))?;
    if let Some(name) = update.name {
      product.name = name.trim().to_string();
    }
    if let Some(description) = update.description {
      product.description = Some(description);
    }
    if let Some(category) = update.category {
      product.category = Some(category);
    }
    if let Some(price) = update.price_cents {
      product.price_cents = price;
    }
    if let Some(stock) = update.stock_quantity {
      product.stock_quantity = stock;
    }
    if let Some(image_url) = update.image_url {
      product.image_url = Some(image_url);
    }
    if let Some(active) = update.active {
      product.active = active;
    }
    product.updated_at = Utc::now();
    Ok(product.clone())
  }

  async fn cart_items(&self, user_id: Uuid) -> Result<Vec<CartItem>> {
    Ok(self.tables.read().cart.iter().filter(|c| c.user_id == user_id).cloned().collect())
  }

  async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>> {
    let t = self.tables.read();
    let mut items: Vec<&CartItem> = t.cart.iter().filter(|c| c.user_id == user_id).collect();
    items.sort_by_key(|c| c.added_at);
    Ok(
      items
        .into_iter()
        .filter_map(|item| {
          t.products.get(&item.product_id).map(|p| CartLine {
            product_id: p.id,
            trader_id: p.trader_id,
            name: p.name.clone(),
            unit_price_cents: p.price_cents,
            quantity: item.quantity,
            stock_available: p.stock_quantity,
            active: p.active,
          })
        })
        .collect(),
    )
  }

  async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem> {
    let mut t = self.tables.write();
    if let Some(existing) = t
      .cart
      .iter_mut()
      .find(|c| c.user_id == user_id && c.product_id == product_id)
    {
      existing.quantity += quantity;
      return Ok(existing.clone());
    }
    let item = CartItem {
      id: Uuid::new_v4(),
      user_id,
      product_id,
      quantity,
      added_at: Utc::now(),
    };
    t.cart.push(item.clone());
    Ok(item)
  }

  async fn set_cart_quantity(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<Option<CartItem>> {
    let mut t = self.tables.write();
    Ok(
      t.cart
        .iter_mut()
        .find(|c| c.user_id == user_id && c.product_id == product_id)
        .map(|item| {
          item.quantity = quantity;
          item.clone()
        }),
    )
  }

  async fn remove_from_cart(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
    let mut t = self.tables.write();
    let before = t.cart.len();
    t.cart.retain(|c| !(c.user_id == user_id && c.product_id == product_id));
    Ok(t.cart.len() != before)
  }

  async fn wishlist(&self, user_id: Uuid) -> Result<Vec<WishlistItem>> {
    Ok(
      self
        .tables
        .read()
        .wishlist
        .iter()
        .filter(|w| w.user_id == user_id)
        .cloned()
        .collect(),
    )
  }

  async fn add_to_wishlist(&self, user_id: Uuid, product_id: Uuid) -> Result<WishlistItem> {
    let mut t = self.tables.write();
    if let Some(existing) = t.wishlist.iter().find(|w| w.user_id == user_id && w.product_id == product_id) {
      return Ok(existing.clone());
    }
    let item = WishlistItem {
      id: Uuid::new_v4(),
      user_id,
      product_id,
      added_at: Utc::now(),
    };
    t.wishlist.push(item.clone());
    Ok(item)
  }

  async fn remove_from_wishlist(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
    let mut t = self.tables.write();
    let before = t.wishlist.len();
    t.wishlist.retain(|w| !(w.user_id == user_id && w.product_id == product_id));
    Ok(t.wishlist.len() != before)
  }

  #[instrument(name = "MemoryStore::place_orders", skip_all, fields(buyer_id = %plan.buyer_id, orders = plan.orders.len()))]
  async fn place_orders(&self, plan: &CheckoutPlan, shipping_address: Option<String>) -> Result<Vec<OrderWithItems>> {
    let mut t = self.tables.write();

    // Check every line before touching anything.
    let mut wanted: HashMap<Uuid, i32> = HashMap::new();
    for line in plan.orders.iter().flat_map(|o| &o.lines) {
      *wanted.entry(line.product_id).or_default() += line.quantity;
    }
    for (product_id, quantity) in &wanted {
      let product = t.products.get(product_id).ok_or_else(|| not_found("Product", product_id))?;
      if !product.active || product.stock_quantity < *quantity {
        return Err(AppError::Conflict(format!(
          "'{}' no longer has {} in stock",
          product.name, quantity
        )));
      }
    }

    let now = Utc::now();
    for (product_id, quantity) in &wanted {
      if let Some(product) = t.products.get_mut(product_id) {
        product.stock_quantity -= quantity;
        product.updated_at = now;
      }
    }

    let mut placed = Vec::with_capacity(plan.orders.len());
    for draft in &plan.orders {
      let order = Order {
        id: Uuid::new_v4(),
        buyer_id: plan.buyer_id,
        trader_id: draft.trader_id,
        transporter_id: None,
        status: OrderStatus::Pending,
        subtotal_cents: draft.subtotal_cents,
        shipping_fee_cents: draft.shipping_fee_cents,
        commission_cents: draft.commission_cents,
        transporter_fee_cents: draft.transporter_fee_cents,
        total_cents: draft.total_cents,
        shipping_address: shipping_address.clone(),
        created_at: now,
        updated_at: now,
        delivered_at: None,
      };
      let items: Vec<OrderItem> = draft
        .lines
        .iter()
        .map(|l| OrderItem {
          id: Uuid::new_v4(),
          order_id: order.id,
          product_id: l.product_id,
          product_name: l.product_name.clone(),
          quantity: l.quantity,
          unit_price_cents: l.unit_price_cents,
        })
        .collect();
      t.order_items.extend(items.iter().cloned());
      t.orders.insert(order.id, order.clone());
      placed.push(OrderWithItems { order, items });
    }

    t.cart.retain(|c| c.user_id != plan.buyer_id);
    debug!(placed = placed.len(), "Orders written and cart cleared.");
    Ok(placed)
  }

  async fn order(&self, id: Uuid) -> Result<Option<OrderWithItems>> {
    let t = self.tables.read();
    Ok(t.orders.get(&id).map(|o| t.with_items(o)))
  }

  async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
    let mut found: Vec<Order> = self
      .tables
      .read()
      .orders
      .values()
      .filter(|o| filter.matches(o))
      .cloned()
      .collect();
    found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(found)
  }

  #[instrument(name = "MemoryStore::transition_order", skip(self))]
  async fn transition_order(&self, id: Uuid, expected: OrderStatus, next: OrderStatus, restock: bool) -> Result<Order> {
    let mut t = self.tables.write();
    let current = t.orders.get(&id).ok_or_else(|| not_found("Order", id))?.status;
    if current != expected {
      return Err(AppError::Conflict(format!(
        "order changed to '{}' while it was being updated",
        current
      )));
    }

    let now = Utc::now();
    if restock {
      let returned: Vec<(Uuid, i32)> = t
        .order_items
        .iter()
        .filter(|i| i.order_id == id)
        .map(|i| (i.product_id, i.quantity))
        .collect();
      for (product_id, quantity) in returned {
        if let Some(product) = t.products.get_mut(&product_id) {
          product.stock_quantity += quantity;
          product.updated_at = now;
        }
      }
    }

    let order = t.orders.get_mut(&id).ok_or_else(|| not_found("Order", id))?;
    order.status = next;
    order.updated_at = now;
    if next == OrderStatus::Delivered {
      order.delivered_at = Some(now);
    }
    Ok(order.clone())
  }

  async fn claim_order(&self, id: Uuid, transporter_id: Uuid) -> Result<Order> {
    let mut t = self.tables.write();
    let order = t.orders.get_mut(&id).ok_or_else(|| not_found("Order", id))?;
    if order.status != OrderStatus::Confirmed || order.transporter_id.is_some() {
      return Err(AppError::Conflict("order is no longer available to claim".to_string()));
    }
    order.transporter_id = Some(transporter_id);
    order.updated_at = Utc::now();
    Ok(order.clone())
  }

  async fn order_facts(&self) -> Result<Vec<OrderFact>> {
    let t = self.tables.read();
    Ok(t.orders.values().map(|o| t.with_items(o).to_fact()).collect())
  }

  async fn has_purchased(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
    let t = self.tables.read();
    Ok(t.order_items.iter().any(|item| {
      item.product_id == product_id
        && t
          .orders
          .get(&item.order_id)
          .is_some_and(|o| o.buyer_id == user_id && o.status == OrderStatus::Delivered)
    }))
  }

  async fn create_review(&self, new: NewReview) -> Result<Review> {
    let mut t = self.tables.write();
    if t
      .reviews
      .values()
      .any(|r| r.user_id == new.user_id && r.product_id == new.product_id)
    {
      return Err(AppError::Conflict("you have already reviewed this product".to_string()));
    }
    let now = Utc::now();
    let review = Review {
      id: Uuid::new_v4(),
      product_id: new.product_id,
      user_id: new.user_id,
      rating: new.rating,
      title: new.title,
      comment: new.comment,
      verified_purchase: new.verified_purchase,
      helpful_count: 0,
      not_helpful_count: 0,
      trader_response: None,
      responded_at: None,
      created_at: now,
      updated_at: now,
    };
    t.reviews.insert(review.id, review.clone());
    Ok(review)
  }

  async fn review(&self, id: Uuid) -> Result<Option<Review>> {
    Ok(self.tables.read().reviews.get(&id).cloned())
  }

  async fn reviews_for_product(&self, product_id: Uuid) -> Result<Vec<Review>> {
    Ok(
      self
        .tables
        .read()
        .reviews
        .values()
        .filter(|r| r.product_id == product_id)
        .cloned()
        .collect(),
    )
  }

  async fn has_reviewed(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
    Ok(
      self
        .tables
        .read()
        .reviews
        .values()
        .any(|r| r.user_id == user_id && r.product_id == product_id),
    )
  }

  async fn update_review(&self, id: Uuid, edit: ReviewEdit) -> Result<Review> {
    let mut t = self.tables.write();
    let review = t.reviews.get_mut(&id).ok_or_else(|| not_found("Review", id))?;
    if let Some(rating) = edit.rating {
      review.rating = rating;
    }
    if let Some(title) = edit.title {
      review.title = title;
    }
    if let Some(comment) = edit.comment {
      review.comment = comment;
    }
    review.updated_at = Utc::now();
    Ok(review.clone())
  }

  async fn delete_review(&self, id: Uuid) -> Result<bool> {
    let mut t = self.tables.write();
    let removed = t.reviews.remove(&id).is_some();
    if removed {
      t.votes.retain(|(review_id, _), _| *review_id != id);
    }
    Ok(removed)
  }

  async fn set_review_response(&self, id: Uuid, body: Option<String>, at: Option<DateTime<Utc>>) -> Result<Review> {
    let mut t = self.tables.write();
    let review = t.reviews.get_mut(&id).ok_or_else(|| not_found("Review", id))?;
    review.trader_response = body;
    review.responded_at = at;
    review.updated_at = Utc::now();
    Ok(review.clone())
  }

  async fn vote(&self, review_id: Uuid, user_id: Uuid) -> Result<Option<Vote>> {
    Ok(
      self
        .tables
        .read()
        .votes
        .get(&(review_id, user_id))
        .map(|v| Vote::from_flag(v.helpful)),
    )
  }

  async fn cast_vote(&self, review_id: Uuid, user_id: Uuid, vote: Option<Vote>) -> Result<Review> {
    let mut t = self.tables.write();
    if !t.reviews.contains_key(&review_id) {
      return Err(not_found("Review", review_id));
    }
    let previous = t.votes.get(&(review_id, user_id)).map(|v| Vote::from_flag(v.helpful));
    let delta = vote_delta(previous, vote);
    match vote {
      Some(v) => {
        t.votes.insert(
          (review_id, user_id),
          ReviewVote {
            review_id,
            user_id,
            helpful: v.is_helpful(),
            created_at: Utc::now(),
          },
        );
      }
      None => {
        t.votes.remove(&(review_id, user_id));
      }
    }
    let review = t.reviews.get_mut(&review_id).ok_or_else(|| not_found("Review", review_id))?;
    review.helpful_count += delta.helpful;
    review.not_helpful_count += delta.not_helpful;
    Ok(review.clone())
  }

  async fn settings(&self) -> Result<PlatformSettings> {
    Ok(self.tables.read().settings.clone())
  }

  async fn save_settings(&self, settings: &PlatformSettings) -> Result<()> {
    self.tables.write().settings = settings.clone();
    Ok(())
  }
}
