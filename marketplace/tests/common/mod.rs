// tests/common/mod.rs
#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::test;
use adaze_core::Role;
use adaze_marketplace::build_state;
use adaze_marketplace::config::AppConfig;
use adaze_marketplace::models::{NewProduct, NewProfile, Product};
use adaze_marketplace::services::auth_service;
use adaze_marketplace::state::AppState;
use adaze_marketplace::store::MemoryStore;
use chrono::Utc;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

pub const PASSWORD: &str = "market-day-2024";

// Argon2 is slow in debug builds; hash the shared password once.
static PASSWORD_HASH: Lazy<String> =
  Lazy::new(|| auth_service::hash_password(PASSWORD).expect("hashing the test password works"));

static TRACING: Lazy<()> = Lazy::new(|| {
  let filter = tracing_subscriber::EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_test_writer()
    .try_init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING);
}

/// Fresh in-memory state with every flow registered.
pub fn test_state() -> AppState {
  setup_tracing();
  build_state(Arc::new(MemoryStore::new()), AppConfig::default())
}

#[derive(Debug, Clone)]
pub struct TestUser {
  pub id: Uuid,
  pub email: String,
  pub token: String,
}

impl TestUser {
  pub fn auth(&self) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", self.token))
  }
}

/// Creates a profile and a live session straight through the store.
pub async fn create_user(state: &AppState, email: &str, role: Role) -> TestUser {
  let profile = state
    .store
    .create_profile(NewProfile {
      email: email.to_string(),
      password_hash: PASSWORD_HASH.clone(),
      full_name: format!("{} user", role),
      phone: None,
      role,
    })
    .await
    .expect("profile is created");
  let session = auth_service::new_session(profile.id, state.config.session_ttl_hours, None, Utc::now());
  let token = session.token.clone();
  state.store.create_session(session).await.expect("session is stored");
  TestUser {
    id: profile.id,
    email: profile.email,
    token,
  }
}

pub async fn create_product(state: &AppState, seller: &TestUser, name: &str, price_cents: i64, stock: i32) -> Product {
  state
    .store
    .create_product(NewProduct {
      trader_id: seller.id,
      name: name.to_string(),
      description: Some(format!("{} for testing", name)),
      category: Some("test".to_string()),
      price_cents,
      stock_quantity: stock,
      image_url: None,
    })
    .await
    .expect("product is created")
}

/// Sends a request and returns the status with the JSON body (`Null` when empty).
pub async fn send<S, R, B>(app: &S, req: R) -> (StatusCode, Value)
where
  S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
  B: MessageBody,
{
  let resp = test::call_service(app, req).await;
  let status = resp.status();
  let body = test::read_body(resp).await;
  let json = if body.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&body).unwrap_or(Value::Null)
  };
  (status, json)
}

pub async fn stock_of(state: &AppState, product_id: Uuid) -> i32 {
  state
    .store
    .product(product_id)
    .await
    .expect("store is reachable")
    .expect("product exists")
    .stock_quantity
}
