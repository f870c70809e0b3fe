// marketplace/src/pipelines/mod.rs

//! Multi-step operations, each a flow registered by its state type.

use crate::errors::AppError;
use adaze_core::FlowRegistry;
use tracing::info;

pub mod cart;
pub mod checkout;
pub mod contexts;
pub mod order_status;
pub mod review;
pub mod signin;
pub mod signup;

/// Called once at startup, before the server accepts requests.
pub fn register_all_flows(registry: &FlowRegistry<AppError>) {
  registry.register(signup::build_signup_flow());
  registry.register(signin::build_signin_flow());
  registry.register(cart::build_add_to_cart_flow());
  registry.register(checkout::build_checkout_flow());
  registry.register(order_status::build_order_status_flow());
  registry.register(review::build_review_flow());
  info!(flows = registry.len(), "Application flows registered.");
}
