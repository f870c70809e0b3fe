// marketplace/src/pipelines/contexts.rs

//! State carried through each flow. Every state holds a clone of `AppState`
//! so steps can reach the store and the event bus without globals.

use crate::models::{CartItem, Order, OrderItem, OrderWithItems, Product, Profile, Review, Session};
use crate::state::AppState;
use adaze_core::checkout::{CartLine, CheckoutPlan};
use adaze_core::{Actor, FlowState, OrderStatus, PlatformSettings, Rating, Role, TransitionEffects};
use serde::Serialize;
use uuid::Uuid;

pub struct SignupState {
  pub app: AppState,
  pub email: String,
  pub password: String,
  pub full_name: String,
  pub phone: Option<String>,
  pub role: Role,
  pub profile: Option<Profile>,
}

pub struct SigninState {
  pub app: AppState,
  pub email: String,
  pub password: String,
  pub user_agent: Option<String>,
  pub profile: Option<Profile>,
  pub session: Option<Session>,
}

pub struct AddToCartState {
  pub app: AppState,
  pub actor: Actor,
  pub product_id: Uuid,
  pub quantity: i32,
  pub settings: PlatformSettings,
  pub product: Option<Product>,
  pub already_in_cart: i32,
  pub item: Option<CartItem>,
}

pub struct CheckoutState {
  pub app: AppState,
  pub actor: Actor,
  pub shipping_address: Option<String>,
  pub settings: PlatformSettings,
  pub lines: Vec<CartLine>,
  pub plan: Option<CheckoutPlan>,
  pub placed: Vec<OrderWithItems>,
}

/// Units handed back to stock when an order is cancelled.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RestockState {
  pub order_id: Uuid,
  pub items: Vec<OrderItem>,
  pub products: usize,
  pub units_returned: i64,
}

/// Final money split of a delivered order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SettlementState {
  pub order_id: Uuid,
  pub subtotal_cents: i64,
  pub shipping_fee_cents: i64,
  pub commission_cents: i64,
  pub transporter_fee_cents: i64,
  pub transporter_id: Option<Uuid>,
  pub trader_earnings_cents: i64,
  pub transporter_earnings_cents: i64,
  pub platform_earnings_cents: i64,
}

pub struct OrderStatusState {
  pub app: AppState,
  pub actor: Actor,
  pub order_id: Uuid,
  pub target: OrderStatus,
  pub current: Option<OrderWithItems>,
  pub effects: TransitionEffects,
  pub updated: Option<Order>,
  pub restock: FlowState<RestockState>,
  pub settlement: FlowState<SettlementState>,
}

impl OrderStatusState {
  pub fn new(app: AppState, actor: Actor, order_id: Uuid, target: OrderStatus) -> Self {
    Self {
      app,
      actor,
      order_id,
      target,
      current: None,
      effects: TransitionEffects::default(),
      updated: None,
      restock: FlowState::new(RestockState::default()),
      settlement: FlowState::new(SettlementState::default()),
    }
  }
}

pub struct ReviewSubmissionState {
  pub app: AppState,
  pub actor: Actor,
  pub product_id: Uuid,
  pub rating: i64,
  pub title: Option<String>,
  pub comment: String,
  pub validated: Option<(Rating, Option<String>, String)>,
  pub product: Option<Product>,
  pub verified_purchase: bool,
  pub review: Option<Review>,
}
