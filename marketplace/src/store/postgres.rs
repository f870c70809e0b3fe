// marketplace/src/store/postgres.rs

//! Postgres-backed store. Queries are checked at runtime; multi-row writes run in a transaction.

use crate::errors::{AppError, Result};
use crate::models::{
  CartItem, NewProduct, NewProfile, NewReview, Order, OrderFilter, OrderItem, OrderWithItems, Product, ProductFilter,
  ProductSort, ProductUpdate, Profile, ProfileAdminUpdate, ProfileUpdate, Review, ReviewEdit, Session, WishlistItem,
};
use crate::store::MarketStore;
use adaze_core::analytics::OrderFact;
use adaze_core::checkout::{CartLine, CheckoutPlan};
use adaze_core::review::vote_delta;
use adaze_core::{OrderStatus, PlatformSettings, Vote};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const SCHEMA: &str = include_str!("schema.sql");

const PROFILE_COLUMNS: &str = "id, email, password_hash, full_name, phone, role, suspended, created_at, updated_at";
const PRODUCT_COLUMNS: &str =
  "id, trader_id, name, description, category, price_cents, stock_quantity, image_url, active, created_at, updated_at";
const ORDER_COLUMNS: &str = "id, buyer_id, trader_id, transporter_id, status, subtotal_cents, shipping_fee_cents, \
   commission_cents, transporter_fee_cents, total_cents, shipping_address, created_at, updated_at, delivered_at";
const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, quantity, unit_price_cents";
const REVIEW_COLUMNS: &str = "id, product_id, user_id, rating, title, comment, verified_purchase, helpful_count, \
   not_helpful_count, trader_response, responded_at, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
  match &err {
    sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(message.to_string()),
    _ => AppError::Sqlx(err),
  }
}

fn not_found(what: &str, id: impl std::fmt::Display) -> AppError {
  AppError::NotFound(format!("{} {} not found", what, id))
}

impl PgStore {
  pub async fn connect(database_url: &str) -> Result<Self> {
    let pool = PgPool::connect(database_url).await?;
    info!("Connected to Postgres.");
    Ok(Self { pool })
  }

  pub fn from_pool(pool: PgPool) -> Self {
    Self { pool }
  }

  /// Applies `schema.sql` statement by statement.
  #[instrument(name = "PgStore::migrate", skip(self), err(Display))]
  pub async fn migrate(&self) -> Result<()> {
    let without_comments: String = SCHEMA
      .lines()
      .filter(|line| !line.trim_start().starts_with("--"))
      .collect::<Vec<_>>()
      .join("\n");
    for statement in without_comments.split(';').map(str::trim).filter(|s| !s.is_empty()) {
      sqlx::query(statement).execute(&self.pool).await?;
    }
    sqlx::query("INSERT INTO platform_settings (id, data) VALUES (1, $1) ON CONFLICT (id) DO NOTHING")
      .bind(Json(PlatformSettings::default()))
      .execute(&self.pool)
      .await?;
    info!("Schema applied.");
    Ok(())
  }

  async fn items_for(&self, order_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<OrderItem>>> {
    let items = sqlx::query_as::<_, OrderItem>(&format!(
      "SELECT {} FROM order_items WHERE order_id = ANY($1)",
      ITEM_COLUMNS
    ))
    .bind(order_ids)
    .fetch_all(&self.pool)
    .await?;
    let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in items {
      grouped.entry(item.order_id).or_default().push(item);
    }
    Ok(grouped)
  }
}

#[async_trait]
impl MarketStore for PgStore {
  async fn create_profile(&self, new: NewProfile) -> Result<Profile> {
    sqlx::query_as::<_, Profile>(&format!(
      "INSERT INTO profiles (id, email, password_hash, full_name, phone, role) VALUES ($1, $2, $3, $4, $5, $6) \
       RETURNING {}",
      PROFILE_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(&new.full_name)
    .bind(&new.phone)
    .bind(new.role.as_str())
    .fetch_one(&self.pool)
    .await
    .map_err(|e| conflict_on_unique(e, "An account with this email already exists."))
  }

  async fn profile(&self, id: Uuid) -> Result<Option<Profile>> {
    Ok(
      sqlx::query_as::<_, Profile>(&format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn profile_by_email(&self, email: &str) -> Result<Option<Profile>> {
    Ok(
      sqlx::query_as::<_, Profile>(&format!(
        "SELECT {} FROM profiles WHERE LOWER(email) = LOWER($1)",
        PROFILE_COLUMNS
      ))
      .bind(email)
      .fetch_optional(&self.pool)
      .await?,
    )
  }

  async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Profile> {
    sqlx::query_as::<_, Profile>(&format!(
      "UPDATE profiles SET full_name = COALESCE($2, full_name), \
       phone = CASE WHEN $3::TEXT IS NULL THEN phone ELSE NULLIF(TRIM($3), '') END, updated_at = NOW() \
       WHERE id = $1 RETURNING {}",
      PROFILE_COLUMNS
    ))
    .bind(id)
    .bind(update.full_name)
    .bind(update.phone)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| not_found("Profile", id))
  }

  async fn admin_update_profile(&self, id: Uuid, update: ProfileAdminUpdate) -> Result<Profile> {
    sqlx::query_as::<_, Profile>(&format!(
      "UPDATE profiles SET role = COALESCE($2, role), suspended = COALESCE($3, suspended), updated_at = NOW() \
       WHERE id = $1 RETURNING {}",
      PROFILE_COLUMNS
    ))
    .bind(id)
    .bind(update.role.map(|r| r.as_str()))
    .bind(update.suspended)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| not_found("Profile", id))
  }

  async fn list_profiles(&self) -> Result<Vec<Profile>> {
    Ok(
      sqlx::query_as::<_, Profile>(&format!(
        "SELECT {} FROM profiles ORDER BY created_at DESC",
        PROFILE_COLUMNS
      ))
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn create_session(&self, session: Session) -> Result<()> {
    sqlx::query(
      "INSERT INTO active_sessions (token, user_id, created_at, expires_at, user_agent) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&session.token)
    .bind(session.user_id)
    .bind(session.created_at)
    .bind(session.expires_at)
    .bind(&session.user_agent)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn session(&self, token: &str) -> Result<Option<Session>> {
    Ok(
      sqlx::query_as::<_, Session>(
        "SELECT token, user_id, created_at, expires_at, user_agent FROM active_sessions WHERE token = $1",
      )
      .bind(token)
      .fetch_optional(&self.pool)
      .await?,
    )
  }

  async fn delete_session(&self, token: &str) -> Result<bool> {
    let done = sqlx::query("DELETE FROM active_sessions WHERE token = $1")
      .bind(token)
      .execute(&self.pool)
      .await?;
    Ok(done.rows_affected() > 0)
  }

  async fn live_sessions(&self, now: DateTime<Utc>) -> Result<Vec<Session>> {
    Ok(
      sqlx::query_as::<_, Session>(
        "SELECT token, user_id, created_at, expires_at, user_agent FROM active_sessions \
         WHERE expires_at > $1 ORDER BY created_at DESC",
      )
      .bind(now)
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn create_product(&self, new: NewProduct) -> Result<Product> {
    Ok(
      sqlx::query_as::<_, Product>(&format!(
        "INSERT INTO products (id, trader_id, name, description, category, price_cents, stock_quantity, image_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
        PRODUCT_COLUMNS
      ))
      .bind(Uuid::new_v4())
      .bind(new.trader_id)
      .bind(new.name.trim())
      .bind(&new.description)
      .bind(&new.category)
      .bind(new.price_cents)
      .bind(new.stock_quantity)
      .bind(&new.image_url)
      .fetch_one(&self.pool)
      .await?,
    )
  }

  async fn product(&self, id: Uuid) -> Result<Option<Product>> {
    Ok(
      sqlx::query_as::<_, Product>(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM products WHERE TRUE", PRODUCT_COLUMNS));
    if !filter.include_inactive {
      qb.push(" AND active");
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
      let pattern = format!("%{}%", q.to_lowercase());
      qb.push(" AND (LOWER(name) LIKE ")
        .push_bind(pattern.clone())
        .push(" OR LOWER(COALESCE(description, '')) LIKE ")
        .push_bind(pattern)
        .push(")");
    }
    if let Some(category) = &filter.category {
      qb.push(" AND LOWER(category) = LOWER(").push_bind(category.clone()).push(")");
    }
    if let Some(trader_id) = filter.trader_id {
      qb.push(" AND trader_id = ").push_bind(trader_id);
    }
    if let Some(min) = filter.min_price {
      qb.push(" AND price_cents >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
      qb.push(" AND price_cents <= ").push_bind(max);
    }
    if filter.in_stock {
      qb.push(" AND stock_quantity > 0");
    }
    qb.push(match filter.sort {
      ProductSort::Newest => " ORDER BY created_at DESC",
      ProductSort::PriceAsc => " ORDER BY price_cents ASC, name ASC",
      ProductSort::PriceDesc => " ORDER BY price_cents DESC, name ASC",
      ProductSort::Name => " ORDER BY LOWER(name) ASC",
    });
    Ok(qb.build_query_as::<Product>().fetch_all(&self.pool).await?)
  }

  async fn update_product(&self, id: Uuid, update: ProductUpdate) -> Result<Product> {
    sqlx::query_as::<_, Product>(&format!(
      "UPDATE products SET name = COALESCE(TRIM($2), name), description = COALESCE($3, description), \
       category = COALESCE($4, category), price_cents = COALESCE($5, price_cents), \
       stock_quantity = COALESCE($6, stock_quantity), image_url = COALESCE($7, image_url), \
       active = COALESCE($8, active), updated_at = NOW() WHERE id = $1 RETURNING {}",
      PRODUCT_COLUMNS
    ))
    .bind(id)
    .bind(update.name)
    .bind(update.description)
    .bind(update.category)
    .bind(update.price_cents)
    .bind(update.stock_quantity)
    .bind(update.image_url)
    .bind(update.active)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| not_found("Product", id))
  }

  async fn cart_items(&self, user_id: Uuid) -> Result<Vec<CartItem>> {
    Ok(
      sqlx::query_as::<_, CartItem>(
        "SELECT id, user_id, product_id, quantity, added_at FROM cart WHERE user_id = $1 ORDER BY added_at",
      )
      .bind(user_id)
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn cart_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>> {
    let rows = sqlx::query(
      "SELECT p.id, p.trader_id, p.name, p.price_cents, c.quantity, p.stock_quantity, p.active \
       FROM cart c JOIN products p ON p.id = c.product_id WHERE c.user_id = $1 ORDER BY c.added_at",
    )
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;
    rows
      .into_iter()
      .map(|row| {
        Ok(CartLine {
          product_id: row.try_get("id")?,
          trader_id: row.try_get("trader_id")?,
          name: row.try_get("name")?,
          unit_price_cents: row.try_get("price_cents")?,
          quantity: row.try_get("quantity")?,
          stock_available: row.try_get("stock_quantity")?,
          active: row.try_get("active")?,
        })
      })
      .collect()
  }

  async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<CartItem> {
    Ok(
      sqlx::query_as::<_, CartItem>(
        "INSERT INTO cart (id, user_id, product_id, quantity) VALUES ($1, $2, $3, $4) \
         ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = cart.quantity + EXCLUDED.quantity \
         RETURNING id, user_id, product_id, quantity, added_at",
      )
      .bind(Uuid::new_v4())
      .bind(user_id)
      .bind(product_id)
      .bind(quantity)
      .fetch_one(&self.pool)
      .await?,
    )
  }

  async fn set_cart_quantity(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> Result<Option<CartItem>> {
    Ok(
      sqlx::query_as::<_, CartItem>(
        "UPDATE cart SET quantity = $3 WHERE user_id = $1 AND product_id = $2 \
         RETURNING id, user_id, product_id, quantity, added_at",
      )
      .bind(user_id)
      .bind(product_id)
      .bind(quantity)
      .fetch_optional(&self.pool)
      .await?,
    )
  }

  async fn remove_from_cart(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
    let done = sqlx::query("DELETE FROM cart WHERE user_id = $1 AND product_id = $2")
      .bind(user_id)
      .bind(product_id)
      .execute(&self.pool)
      .await?;
    Ok(done.rows_affected() > 0)
  }

  async fn wishlist(&self, user_id: Uuid) -> Result<Vec<WishlistItem>> {
    Ok(
      sqlx::query_as::<_, WishlistItem>(
        "SELECT id, user_id, product_id, added_at FROM wishlist WHERE user_id = $1 ORDER BY added_at DESC",
      )
      .bind(user_id)
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn add_to_wishlist(&self, user_id: Uuid, product_id: Uuid) -> Result<WishlistItem> {
    Ok(
      sqlx::query_as::<_, WishlistItem>(
        "INSERT INTO wishlist (id, user_id, product_id) VALUES ($1, $2, $3) \
         ON CONFLICT (user_id, product_id) DO UPDATE SET user_id = EXCLUDED.user_id \
         RETURNING id, user_id, product_id, added_at",
      )
      .bind(Uuid::new_v4())
      .bind(user_id)
      .bind(product_id)
      .fetch_one(&self.pool)
      .await?,
    )
  }

  async fn remove_from_wishlist(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
    let done = sqlx::query("DELETE FROM wishlist WHERE user_id = $1 AND product_id = $2")
      .bind(user_id)
      .bind(product_id)
      .execute(&self.pool)
      .await?;
    Ok(done.rows_affected() > 0)
  }

  #[instrument(name = "PgStore::place_orders", skip_all, fields(buyer_id = %plan.buyer_id, orders = plan.orders.len()))]
  async fn place_orders(&self, plan: &CheckoutPlan, shipping_address: Option<String>) -> Result<Vec<OrderWithItems>> {
    let mut wanted: BTreeMap<Uuid, i32> = BTreeMap::new();
    for line in plan.orders.iter().flat_map(|o| &o.lines) {
      *wanted.entry(line.product_id).or_default() += line.quantity;
    }

    let mut tx = self.pool.begin().await?;

    // Ordered by product id so concurrent checkouts lock rows in the same order.
    for (product_id, quantity) in &wanted {
      let done = sqlx::query(
        "UPDATE products SET stock_quantity = stock_quantity - $1, updated_at = NOW() \
         WHERE id = $2 AND active AND stock_quantity >= $1",
      )
      .bind(quantity)
      .bind(product_id)
      .execute(&mut *tx)
      .await?;
      if done.rows_affected() == 0 {
        warn!(%product_id, quantity, "Stock reservation failed, rolling back checkout.");
        return Err(AppError::Conflict(format!(
          "product {} no longer has {} in stock",
          product_id, quantity
        )));
      }
    }

    let mut placed = Vec::with_capacity(plan.orders.len());
    for draft in &plan.orders {
      let order = sqlx::query_as::<_, Order>(&format!(
        "INSERT INTO orders (id, buyer_id, trader_id, status, subtotal_cents, shipping_fee_cents, commission_cents, \
         transporter_fee_cents, total_cents, shipping_address) VALUES ($1, $2, $3, 'pending', $4, $5, $6, $7, $8, $9) \
         RETURNING {}",
        ORDER_COLUMNS
      ))
      .bind(Uuid::new_v4())
      .bind(plan.buyer_id)
      .bind(draft.trader_id)
      .bind(draft.subtotal_cents)
      .bind(draft.shipping_fee_cents)
      .bind(draft.commission_cents)
      .bind(draft.transporter_fee_cents)
      .bind(draft.total_cents)
      .bind(&shipping_address)
      .fetch_one(&mut *tx)
      .await?;

      let mut items = Vec::with_capacity(draft.lines.len());
      for line in &draft.lines {
        let item = sqlx::query_as::<_, OrderItem>(&format!(
          "INSERT INTO order_items (id, order_id, product_id, product_name, quantity, unit_price_cents) \
           VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
          ITEM_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(order.id)
        .bind(line.product_id)
        .bind(&line.product_name)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .fetch_one(&mut *tx)
        .await?;
        items.push(item);
      }
      placed.push(OrderWithItems { order, items });
    }

    sqlx::query("DELETE FROM cart WHERE user_id = $1")
      .bind(plan.buyer_id)
      .execute(&mut *tx)
      .await?;
    tx.commit().await?;
    debug!(placed = placed.len(), "Orders written and cart cleared.");
    Ok(placed)
  }

  async fn order(&self, id: Uuid) -> Result<Option<OrderWithItems>> {
    let order = sqlx::query_as::<_, Order>(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    let Some(order) = order else {
      return Ok(None);
    };
    let items = self.items_for(&[order.id]).await?.remove(&order.id).unwrap_or_default();
    Ok(Some(OrderWithItems { order, items }))
  }

  async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM orders WHERE TRUE", ORDER_COLUMNS));
    if let Some(id) = filter.buyer_id {
      qb.push(" AND buyer_id = ").push_bind(id);
    }
    if let Some(id) = filter.trader_id {
      qb.push(" AND trader_id = ").push_bind(id);
    }
    if let Some(id) = filter.transporter_id {
      qb.push(" AND transporter_id = ").push_bind(id);
    }
    if let Some(status) = filter.status {
      qb.push(" AND status = ").push_bind(status.as_str());
    }
    if filter.unassigned {
      qb.push(" AND transporter_id IS NULL");
    }
    qb.push(" ORDER BY created_at DESC");
    Ok(qb.build_query_as::<Order>().fetch_all(&self.pool).await?)
  }

  #[instrument(name = "PgStore::transition_order", skip(self))]
  async fn transition_order(&self, id: Uuid, expected: OrderStatus, next: OrderStatus, restock: bool) -> Result<Order> {
    let mut tx = self.pool.begin().await?;
    let updated = sqlx::query_as::<_, Order>(&format!(
      "UPDATE orders SET status = $1, updated_at = NOW(), \
       delivered_at = CASE WHEN $1 = 'delivered' THEN NOW() ELSE delivered_at END \
       WHERE id = $2 AND status = $3 RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(next.as_str())
    .bind(id)
    .bind(expected.as_str())
    .fetch_optional(&mut *tx)
    .await?;

    let Some(order) = updated else {
      let current: Option<String> = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
      return Err(match current {
        None => not_found("Order", id),
        Some(status) => AppError::Conflict(format!("order changed to '{}' while it was being updated", status)),
      });
    };

    if restock {
      let done = sqlx::query(
        "UPDATE products p SET stock_quantity = p.stock_quantity + oi.quantity, updated_at = NOW() \
         FROM order_items oi WHERE oi.order_id = $1 AND oi.product_id = p.id",
      )
      .bind(id)
      .execute(&mut *tx)
      .await?;
      debug!(products = done.rows_affected(), "Restocked cancelled order.");
    }

    tx.commit().await?;
    Ok(order)
  }

  async fn claim_order(&self, id: Uuid, transporter_id: Uuid) -> Result<Order> {
    let claimed = sqlx::query_as::<_, Order>(&format!(
      "UPDATE orders SET transporter_id = $1, updated_at = NOW() \
       WHERE id = $2 AND status = 'confirmed' AND transporter_id IS NULL RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(transporter_id)
    .bind(id)
    .fetch_optional(&self.pool)
    .await?;
    match claimed {
      Some(order) => Ok(order),
      None if self.order(id).await?.is_none() => Err(not_found("Order", id)),
      None => Err(AppError::Conflict("order is no longer available to claim".to_string())),
    }
  }

  async fn order_facts(&self) -> Result<Vec<OrderFact>> {
    let orders = sqlx::query_as::<_, Order>(&format!("SELECT {} FROM orders", ORDER_COLUMNS))
      .fetch_all(&self.pool)
      .await?;
    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut items = self.items_for(&ids).await?;
    Ok(
      orders
        .into_iter()
        .map(|order| {
          let items = items.remove(&order.id).unwrap_or_default();
          OrderWithItems { order, items }.to_fact()
        })
        .collect(),
    )
  }

  async fn has_purchased(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
    Ok(
      sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM orders o JOIN order_items oi ON oi.order_id = o.id \
         WHERE o.buyer_id = $1 AND oi.product_id = $2 AND o.status = 'delivered')",
      )
      .bind(user_id)
      .bind(product_id)
      .fetch_one(&self.pool)
      .await?,
    )
  }

  async fn create_review(&self, new: NewReview) -> Result<Review> {
    sqlx::query_as::<_, Review>(&format!(
      "INSERT INTO reviews (id, product_id, user_id, rating, title, comment, verified_purchase) \
       VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
      REVIEW_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(new.product_id)
    .bind(new.user_id)
    .bind(i16::from(new.rating))
    .bind(&new.title)
    .bind(&new.comment)
    .bind(new.verified_purchase)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| conflict_on_unique(e, "you have already reviewed this product"))
  }

  async fn review(&self, id: Uuid) -> Result<Option<Review>> {
    Ok(
      sqlx::query_as::<_, Review>(&format!("SELECT {} FROM reviews WHERE id = $1", REVIEW_COLUMNS))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn reviews_for_product(&self, product_id: Uuid) -> Result<Vec<Review>> {
    Ok(
      sqlx::query_as::<_, Review>(&format!(
        "SELECT {} FROM reviews WHERE product_id = $1",
        REVIEW_COLUMNS
      ))
      .bind(product_id)
      .fetch_all(&self.pool)
      .await?,
    )
  }

  async fn has_reviewed(&self, user_id: Uuid, product_id: Uuid) -> Result<bool> {
    Ok(
      sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM reviews WHERE user_id = $1 AND product_id = $2)")
        .bind(user_id)
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?,
    )
  }

  async fn update_review(&self, id: Uuid, edit: ReviewEdit) -> Result<Review> {
    let (set_title, title) = match edit.title {
      Some(title) => (true, title),
      None => (false, None),
    };
    sqlx::query_as::<_, Review>(&format!(
      "UPDATE reviews SET rating = COALESCE($2, rating), \
       title = CASE WHEN $3 THEN $4 ELSE title END, comment = COALESCE($5, comment), updated_at = NOW() \
       WHERE id = $1 RETURNING {}",
      REVIEW_COLUMNS
    ))
    .bind(id)
    .bind(edit.rating.map(i16::from))
    .bind(set_title)
    .bind(title)
    .bind(edit.comment)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| not_found("Review", id))
  }

  async fn delete_review(&self, id: Uuid) -> Result<bool> {
    let done = sqlx::query("DELETE FROM reviews WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;
    Ok(done.rows_affected() > 0)
  }

  async fn set_review_response(&self, id: Uuid, body: Option<String>, at: Option<DateTime<Utc>>) -> Result<Review> {
    sqlx::query_as::<_, Review>(&format!(
      "UPDATE reviews SET trader_response = $2, responded_at = $3, updated_at = NOW() WHERE id = $1 RETURNING {}",
      REVIEW_COLUMNS
    ))
    .bind(id)
    .bind(body)
    .bind(at)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| not_found("Review", id))
  }

  async fn vote(&self, review_id: Uuid, user_id: Uuid) -> Result<Option<Vote>> {
    let helpful: Option<bool> =
      sqlx::query_scalar("SELECT helpful FROM review_votes WHERE review_id = $1 AND user_id = $2")
        .bind(review_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
    Ok(helpful.map(Vote::from_flag))
  }

  async fn cast_vote(&self, review_id: Uuid, user_id: Uuid, vote: Option<Vote>) -> Result<Review> {
    let mut tx = self.pool.begin().await?;
    let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM reviews WHERE id = $1 FOR UPDATE")
      .bind(review_id)
      .fetch_optional(&mut *tx)
      .await?;
    if exists.is_none() {
      return Err(not_found("Review", review_id));
    }

    let previous: Option<bool> =
      sqlx::query_scalar("SELECT helpful FROM review_votes WHERE review_id = $1 AND user_id = $2")
        .bind(review_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
    let delta = vote_delta(previous.map(Vote::from_flag), vote);

    match vote {
      Some(v) => {
        sqlx::query(
          "INSERT INTO review_votes (review_id, user_id, helpful) VALUES ($1, $2, $3) \
           ON CONFLICT (review_id, user_id) DO UPDATE SET helpful = EXCLUDED.helpful",
        )
        .bind(review_id)
        .bind(user_id)
        .bind(v.is_helpful())
        .execute(&mut *tx)
        .await?;
      }
      None => {
        sqlx::query("DELETE FROM review_votes WHERE review_id = $1 AND user_id = $2")
          .bind(review_id)
          .bind(user_id)
          .execute(&mut *tx)
          .await?;
      }
    }

    let review = sqlx::query_as::<_, Review>(&format!(
      "UPDATE reviews SET helpful_count = helpful_count + $2, not_helpful_count = not_helpful_count + $3 \
       WHERE id = $1 RETURNING {}",
      REVIEW_COLUMNS
    ))
    .bind(review_id)
    .bind(delta.helpful)
    .bind(delta.not_helpful)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(review)
  }

  async fn settings(&self) -> Result<PlatformSettings> {
    let stored: Option<Json<PlatformSettings>> =
      sqlx::query_scalar("SELECT data FROM platform_settings WHERE id = 1")
        .fetch_optional(&self.pool)
        .await?;
    Ok(stored.map(|Json(s)| s).unwrap_or_default())
  }

  async fn save_settings(&self, settings: &PlatformSettings) -> Result<()> {
    sqlx::query(
      "INSERT INTO platform_settings (id, data, updated_at) VALUES (1, $1, NOW()) \
       ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()",
    )
    .bind(Json(settings))
    .execute(&self.pool)
    .await?;
    Ok(())
  }
}
