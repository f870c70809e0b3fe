// core/src/flow/hooks.rs

//! Registration of `before`, `on` and `after` handlers.

use crate::error::FlowError;
use crate::flow::control::FlowControl;
use crate::flow::definition::Flow;
use crate::flow::handler::Handler;
use crate::flow::state::FlowState;
use std::collections::HashMap;
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
  Before,
  On,
  After,
}

impl Phase {
  pub(crate) fn label(self) -> &'static str {
    match self {
      Phase::Before => "before",
      Phase::On => "on",
      Phase::After => "after",
    }
  }
}

impl<T, E> Flow<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn wrap<F, HErr>(handler_fn: impl Fn(FlowState<T>) -> F + Send + Sync + 'static) -> Handler<T, E>
  where
    F: Future<Output = Result<FlowControl, HErr>> + Send + 'static,
    HErr: Into<E> + Send + Sync + 'static,
  {
    Box::new(move |state| {
      let fut = handler_fn(state);
      Box::pin(async move { fut.await.map_err(Into::into) })
    })
  }

  pub(crate) fn handlers_mut(&mut self, phase: Phase) -> &mut HashMap<String, Vec<Handler<T, E>>> {
    match phase {
      Phase::Before => &mut self.before,
      Phase::On => &mut self.on,
      Phase::After => &mut self.after,
    }
  }

  pub(crate) fn handlers(&self, phase: Phase, stage: &str) -> Option<&Vec<Handler<T, E>>> {
    let map = match phase {
      Phase::Before => &self.before,
      Phase::On => &self.on,
      Phase::After => &self.after,
    };
    map.get(stage).filter(|v| !v.is_empty())
  }

  fn push_handler(&mut self, phase: Phase, stage: &str, handler: Handler<T, E>) {
    self.ensure_stage_exists(stage);
    self.handlers_mut(phase).entry(stage.to_string()).or_default().push(handler);
  }

  /// Runs ahead of the stage's main handlers. Guards and precondition checks go here.
  pub fn before<F, HErr>(&mut self, stage: &str, handler_fn: impl Fn(FlowState<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<FlowControl, HErr>> + Send + 'static,
    HErr: Into<E> + Send + Sync + 'static,
  {
    self.push_handler(Phase::Before, stage, Self::wrap(handler_fn));
  }

  pub fn on<F, HErr>(&mut self, stage: &str, handler_fn: impl Fn(FlowState<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<FlowControl, HErr>> + Send + 'static,
    HErr: Into<E> + Send + Sync + 'static,
  {
    self.push_handler(Phase::On, stage, Self::wrap(handler_fn));
  }

  pub fn after<F, HErr>(&mut self, stage: &str, handler_fn: impl Fn(FlowState<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<FlowControl, HErr>> + Send + 'static,
    HErr: Into<E> + Send + Sync + 'static,
  {
    self.push_handler(Phase::After, stage, Self::wrap(handler_fn));
  }
}
