// marketplace/src/web/handlers/mod.rs

pub mod admin_handlers;
pub mod auth_handlers;
pub mod cart_handlers;
pub mod checkout_handlers;
pub mod dashboard_handlers;
pub mod event_handlers;
pub mod order_handlers;
pub mod product_handlers;
pub mod review_handlers;
pub mod wishlist_handlers;

use crate::errors::{AppError, Result};
use crate::state::AppState;
use adaze_core::{FlowOutcome, FlowState};
use tracing::warn;

/// Runs the flow registered for `T`. A flow that halts without an error is
/// reported as `Halted`, since every request flow is expected to complete.
pub(crate) async fn run_flow<T>(app: &AppState, state: FlowState<T>, operation: &str) -> Result<()>
where
  T: Send + Sync + 'static,
{
  match app.flows.run(state).await {
    Ok(FlowOutcome::Completed) => Ok(()),
    Ok(FlowOutcome::Halted) => {
      warn!(operation, "Flow halted by a step.");
      Err(AppError::Halted(format!("{} did not complete.", operation)))
    }
    Err(err) => {
      warn!(operation, error = %err, "Flow failed.");
      Err(err)
    }
  }
}
