// marketplace/src/models/wishlist.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WishlistItem {
  pub id: Uuid,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub added_at: DateTime<Utc>,
}
