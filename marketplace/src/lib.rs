// marketplace/src/lib.rs

//! adaze-marketplace: the HTTP service for the ADAZE marketplace.
//!
//! Requests are handled by actix-web handlers that either talk to the
//! [`store::MarketStore`] directly or run one of the flows registered in
//! [`pipelines`]. Rules (order transitions, review gates, checkout planning)
//! live in `adaze-core`.

pub mod config;
pub mod errors;
pub mod events;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod web;

use crate::config::AppConfig;
use crate::state::AppState;
use crate::store::MarketStore;
use std::sync::Arc;

/// Application state with every flow registered, ready to be served.
pub fn build_state(store: Arc<dyn MarketStore>, config: AppConfig) -> AppState {
  let state = AppState::new(store, config);
  pipelines::register_all_flows(&state.flows);
  state
}
