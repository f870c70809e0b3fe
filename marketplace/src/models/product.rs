// marketplace/src/models/product.rs

use adaze_core::settings::MAX_PRICE_CENTS;
use adaze_core::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
  pub id: Uuid,
  pub trader_id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub category: Option<String>,
  pub price_cents: i64,
  pub stock_quantity: i32,
  pub image_url: Option<String>,
  /// Archived products stay referenced by orders but are hidden from listings.
  pub active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Product {
  pub fn in_stock(&self) -> bool {
    self.active && self.stock_quantity > 0
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
  #[serde(skip)]
  pub trader_id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub category: Option<String>,
  pub price_cents: i64,
  pub stock_quantity: i32,
  pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
  pub name: Option<String>,
  pub description: Option<String>,
  pub category: Option<String>,
  pub price_cents: Option<i64>,
  pub stock_quantity: Option<i32>,
  pub image_url: Option<String>,
  pub active: Option<bool>,
}

impl NewProduct {
  pub fn validate(&self) -> Result<(), DomainError> {
    validate_fields(Some(&self.name), Some(self.price_cents), Some(self.stock_quantity))
  }
}

impl ProductUpdate {
  pub fn validate(&self) -> Result<(), DomainError> {
    validate_fields(self.name.as_deref(), self.price_cents, self.stock_quantity)
  }
}

fn validate_fields(name: Option<&str>, price_cents: Option<i64>, stock: Option<i32>) -> Result<(), DomainError> {
  if let Some(name) = name {
    if name.trim().is_empty() {
      return Err(DomainError::Validation("product name cannot be empty".to_string()));
    }
  }
  if price_cents.is_some_and(|p| p <= 0) {
    return Err(DomainError::Validation("price must be greater than zero".to_string()));
  }
  if price_cents.is_some_and(|p| p > MAX_PRICE_CENTS) {
    return Err(DomainError::Validation(format!(
      "price cannot exceed {} cents",
      MAX_PRICE_CENTS
    )));
  }
  if stock.is_some_and(|s| s < 0) {
    return Err(DomainError::Validation("stock cannot be negative".to_string()));
  }
  Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
  #[default]
  Newest,
  PriceAsc,
  PriceDesc,
  Name,
}

impl FromStr for ProductSort {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "newest" => Ok(ProductSort::Newest),
      "price_asc" => Ok(ProductSort::PriceAsc),
      "price_desc" => Ok(ProductSort::PriceDesc),
      "name" => Ok(ProductSort::Name),
      other => Err(DomainError::Validation(format!("unknown product sort '{}'", other))),
    }
  }
}

/// Catalogue query. Unset fields do not filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
  pub q: Option<String>,
  pub category: Option<String>,
  pub trader_id: Option<Uuid>,
  pub min_price: Option<i64>,
  pub max_price: Option<i64>,
  #[serde(default)]
  pub in_stock: bool,
  #[serde(default)]
  pub sort: ProductSort,
  /// Only set server-side, for a seller browsing their own catalogue.
  #[serde(skip)]
  pub include_inactive: bool,
}

impl ProductFilter {
  pub fn matches(&self, product: &Product) -> bool {
    if !self.include_inactive && !product.active {
      return false;
    }
    if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
      let needle = q.to_lowercase();
      let in_name = product.name.to_lowercase().contains(&needle);
      let in_description = product
        .description
        .as_deref()
        .is_some_and(|d| d.to_lowercase().contains(&needle));
      if !in_name && !in_description {
        return false;
      }
    }
    if let Some(category) = &self.category {
      if !product.category.as_deref().is_some_and(|c| c.eq_ignore_ascii_case(category)) {
        return false;
      }
    }
    if self.trader_id.is_some_and(|t| t != product.trader_id) {
      return false;
    }
    if self.min_price.is_some_and(|min| product.price_cents < min) {
      return false;
    }
    if self.max_price.is_some_and(|max| product.price_cents > max) {
      return false;
    }
    if self.in_stock && product.stock_quantity <= 0 {
      return false;
    }
    true
  }
}

pub fn sort_products(products: &mut [Product], sort: ProductSort) {
  match sort {
    ProductSort::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    ProductSort::PriceAsc => products.sort_by(|a, b| a.price_cents.cmp(&b.price_cents).then_with(|| a.name.cmp(&b.name))),
    ProductSort::PriceDesc => products.sort_by(|a, b| b.price_cents.cmp(&a.price_cents).then_with(|| a.name.cmp(&b.name))),
    ProductSort::Name => products.sort_by_key(|p| p.name.to_lowercase()),
  }
}
