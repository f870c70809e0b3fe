// marketplace/src/services/seed.rs

//! Demo accounts and a small catalogue for local runs (`SEED_DEMO_DATA=true`).

use crate::errors::Result;
use crate::models::{NewProduct, NewProfile};
use crate::services::auth_service;
use crate::store::MarketStore;
use adaze_core::Role;
use tracing::{info, instrument};

pub const DEMO_PASSWORD: &str = "adaze-demo-pass";

const DEMO_USERS: [(&str, &str, Role); 5] = [
  ("admin@adaze.test", "Ada Admin", Role::Admin),
  ("trader@adaze.test", "Tunde Trader", Role::Trader),
  ("wholesale@adaze.test", "Wura Wholesale", Role::Wholesaler),
  ("buyer@adaze.test", "Bola Buyer", Role::Buyer),
  ("transporter@adaze.test", "Tayo Transporter", Role::Transporter),
];

const DEMO_PRODUCTS: [(&str, &str, &str, i64, i32); 4] = [
  ("Yam tubers (5 kg)", "Fresh white yam from Benue.", "produce", 4_500, 40),
  ("Palm oil (5 L)", "Red palm oil, locally pressed.", "pantry", 7_800, 25),
  ("Ankara fabric (6 yards)", "Printed cotton wax fabric.", "textiles", 12_000, 15),
  ("Shea butter (500 g)", "Unrefined grade A shea butter.", "beauty", 3_200, 60),
];

/// Does nothing when the demo admin already exists.
#[instrument(name = "seed::demo_data", skip(store), err(Display))]
pub async fn seed_demo_data(store: &dyn MarketStore) -> Result<()> {
  if store.profile_by_email(DEMO_USERS[0].0).await?.is_some() {
    info!("Demo data already present, skipping seed.");
    return Ok(());
  }

  let password_hash = auth_service::hash_password(DEMO_PASSWORD)?;
  let mut sellers = Vec::new();
  for (email, name, role) in DEMO_USERS {
    let profile = store
      .create_profile(NewProfile {
        email: email.to_string(),
        password_hash: password_hash.clone(),
        full_name: name.to_string(),
        phone: None,
        role,
      })
      .await?;
    if role.sells() {
      sellers.push(profile.id);
    }
  }

  for (i, (name, description, category, price_cents, stock)) in DEMO_PRODUCTS.into_iter().enumerate() {
    store
      .create_product(NewProduct {
        trader_id: sellers[i % sellers.len()],
        name: name.to_string(),
        description: Some(description.to_string()),
        category: Some(category.to_string()),
        price_cents,
        stock_quantity: stock,
        image_url: None,
      })
      .await?;
  }

  info!(users = DEMO_USERS.len(), products = DEMO_PRODUCTS.len(), "Demo data seeded.");
  Ok(())
}
