// marketplace/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::events::EventBus;
use crate::store::MarketStore;
use adaze_core::FlowRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn MarketStore>,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
  pub events: EventBus,
}

impl AppState {
  /// State with an empty registry. Call `pipelines::register_all_flows` before serving.
  pub fn new(store: Arc<dyn MarketStore>, config: AppConfig) -> Self {
    let events = EventBus::new(config.event_buffer);
    Self {
      store,
      flows: Arc::new(FlowRegistry::new()),
      config: Arc::new(config),
      events,
    }
  }
}
