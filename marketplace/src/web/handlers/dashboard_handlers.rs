// marketplace/src/web/handlers/dashboard_handlers.rs

use actix_web::{web, HttpResponse};
use adaze_core::analytics::{buyer_dashboard, revenue_summary, status_counts, trader_dashboard, transporter_dashboard};
use adaze_core::{OrderStatus, Role};
use serde_json::json;
use tracing::instrument;

use crate::errors::Result;
use crate::models::OrderFilter;
use crate::state::AppState;
use crate::web::AuthenticatedUser;

/// One summary per role. Wholesalers get both their selling and buying side.
#[instrument(name = "handler::dashboard", skip_all, fields(user_id = %user.actor.user_id, role = %user.actor.role))]
pub async fn dashboard_handler(app_state: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse> {
  let facts = app_state.store.order_facts().await?;
  let id = user.actor.user_id;
  let body = match user.actor.role {
    Role::Buyer => json!({ "role": "buyer", "buying": buyer_dashboard(&facts, id) }),
    Role::Trader => json!({ "role": "trader", "selling": trader_dashboard(&facts, id) }),
    Role::Wholesaler => json!({
      "role": "wholesaler",
      "selling": trader_dashboard(&facts, id),
      "buying": buyer_dashboard(&facts, id),
    }),
    Role::Transporter => {
      let available = app_state
        .store
        .list_orders(&OrderFilter {
          status: Some(OrderStatus::Confirmed),
          unassigned: true,
          ..OrderFilter::default()
        })
        .await?
        .len();
      json!({
        "role": "transporter",
        "delivering": transporter_dashboard(&facts, id),
        "available_deliveries": available,
      })
    }
    Role::Admin => json!({
      "role": "admin",
      "revenue": revenue_summary(&facts),
      "status_counts": status_counts(&facts),
    }),
  };
  Ok(HttpResponse::Ok().json(body))
}
