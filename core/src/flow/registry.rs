// core/src/flow/registry.rs

//! `FlowRegistry<E>`: flows keyed by the type of state they run on.

use crate::error::FlowError;
use crate::flow::control::FlowOutcome;
use crate::flow::definition::Flow;
use crate::flow::state::FlowState;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, Level};

#[async_trait]
trait AnyFlowRunner<AppErr>: Send + Sync
where
  AppErr: std::error::Error + Send + Sync + 'static,
{
  async fn run_erased(&self, state: Box<dyn Any + Send>) -> Result<FlowOutcome, AppErr>;
  fn stage_names(&self) -> Vec<String>;
}

struct FlowRunner<T, HErr, AppErr>
where
  T: 'static + Send + Sync,
  HErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<HErr> + From<FlowError> + Send + Sync + 'static,
{
  flow: Arc<Flow<T, HErr>>,
  _app_err: PhantomData<fn() -> AppErr>,
}

#[async_trait]
impl<T, HErr, AppErr> AnyFlowRunner<AppErr> for FlowRunner<T, HErr, AppErr>
where
  T: 'static + Send + Sync,
  HErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<HErr> + From<FlowError> + Send + Sync + 'static,
{
  async fn run_erased(&self, state: Box<dyn Any + Send>) -> Result<FlowOutcome, AppErr> {
    let state = match state.downcast::<FlowState<T>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        return Err(AppErr::from(FlowError::TypeMismatch {
          stage: "registry_dispatch".to_string(),
          expected_type: std::any::type_name::<FlowState<T>>().to_string(),
        }))
      }
    };
    self.flow.run(state).await.map_err(AppErr::from)
  }

  fn stage_names(&self) -> Vec<String> {
    self.flow.stage_names().into_iter().map(str::to_string).collect()
  }
}

/// Holds one flow per state type. `run` looks the flow up from the state alone.
pub struct FlowRegistry<AppErr = FlowError>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  flows: RwLock<HashMap<TypeId, Arc<dyn AnyFlowRunner<AppErr>>>>,
}

impl<AppErr> Default for FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<AppErr> FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      flows: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `flow` for state type `T`, replacing any earlier one.
  pub fn register<T, HErr>(&self, flow: Flow<T, HErr>)
  where
    T: 'static + Send + Sync,
    HErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
    AppErr: From<HErr>,
  {
    event!(Level::DEBUG, state_type = %std::any::type_name::<T>(), "Registering flow.");
    let runner = FlowRunner::<T, HErr, AppErr> {
      flow: Arc::new(flow),
      _app_err: PhantomData,
    };
    self.flows.write().insert(TypeId::of::<T>(), Arc::new(runner));
  }

  pub fn contains<T: 'static + Send + Sync>(&self) -> bool {
    self.flows.read().contains_key(&TypeId::of::<T>())
  }

  pub fn len(&self) -> usize {
    self.flows.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.flows.read().is_empty()
  }

  /// Stage names of the flow registered for `T`, if any.
  pub fn stages_of<T: 'static + Send + Sync>(&self) -> Option<Vec<String>> {
    self.flows.read().get(&TypeId::of::<T>()).map(|r| r.stage_names())
  }

  pub async fn run<T>(&self, state: FlowState<T>) -> Result<FlowOutcome, AppErr>
  where
    T: 'static + Send + Sync,
  {
    let runner = self.flows.read().get(&TypeId::of::<T>()).cloned();
    let Some(runner) = runner else {
      let type_name = std::any::type_name::<T>();
      event!(Level::ERROR, state_type = %type_name, "No flow registered.");
      return Err(AppErr::from(FlowError::Configuration {
        stage: "FlowRegistry::run".to_string(),
        message: format!("no flow registered for state type {}", type_name),
      }));
    };
    runner.run_erased(Box::new(state)).await
  }
}
