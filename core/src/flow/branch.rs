// core/src/flow/branch.rs

//! Conditional branches: a stage that picks one sub-flow based on the state.
//!
//! ```ignore
//! flow
//!   .branches_for_stage("apply_effects")
//!   .when("restock", |s: &Ctx| s.restock, restock_flow, |state| Ok(state.read().restock_state()))
//!   .when("settle", |s: &Ctx| s.settle, settle_flow, |state| Ok(state.read().settle_state()))
//!   .otherwise(FlowControl::Continue)
//!   .finalize(false);
//! ```

use crate::error::FlowError;
use crate::flow::control::{FlowControl, FlowOutcome};
use crate::flow::definition::Flow;
use crate::flow::handler::Handler;
use crate::flow::state::FlowState;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{event, Level};

type Condition<T> = Arc<dyn Fn(&T) -> bool + Send + Sync + 'static>;
type Extractor<T, S> = Arc<dyn Fn(&FlowState<T>) -> Result<FlowState<S>, FlowError> + Send + Sync + 'static>;

#[async_trait]
trait AnyBranch<T, E>: Send + Sync
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn label(&self) -> &str;
  fn matches(&self, data: &T) -> bool;
  async fn execute(&self, stage: &str, state: FlowState<T>) -> Result<FlowControl, E>;
}

struct Branch<T, S, E>
where
  T: 'static + Send + Sync,
  S: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  label: String,
  condition: Condition<T>,
  sub_flow: Arc<Flow<S, E>>,
  extractor: Extractor<T, S>,
}

#[async_trait]
impl<T, S, E> AnyBranch<T, E> for Branch<T, S, E>
where
  T: 'static + Send + Sync,
  S: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn label(&self) -> &str {
    &self.label
  }

  fn matches(&self, data: &T) -> bool {
    (self.condition)(data)
  }

  async fn execute(&self, stage: &str, state: FlowState<T>) -> Result<FlowControl, E> {
    let sub_state = (self.extractor)(&state).map_err(|err| {
      let err = match err {
        FlowError::Handler { source } | FlowError::ExtractorFailure { source, .. } => FlowError::ExtractorFailure {
          stage: stage.to_string(),
          source,
        },
        other => other,
      };
      E::from(err)
    })?;

    match self.sub_flow.run(sub_state).await? {
      FlowOutcome::Completed => Ok(FlowControl::Continue),
      FlowOutcome::Halted => Ok(FlowControl::Halt),
    }
  }
}

/// Collects the branches of one stage. Nothing is registered until `finalize`.
pub struct BranchBuilder<'f, T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  flow: &'f mut Flow<T, E>,
  stage: String,
  branches: Vec<Arc<dyn AnyBranch<T, E>>>,
  otherwise: FlowControl,
}

impl<'f, T, E> BranchBuilder<'f, T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) fn new(flow: &'f mut Flow<T, E>, stage: String) -> Self {
    Self {
      flow,
      stage,
      branches: Vec::new(),
      otherwise: FlowControl::Continue,
    }
  }

  /// Adds a branch. Branches are tried in the order they were added and only
  /// the first match runs.
  pub fn when<S>(
    mut self,
    label: &str,
    condition: impl Fn(&T) -> bool + Send + Sync + 'static,
    sub_flow: Arc<Flow<S, E>>,
    extractor: impl Fn(&FlowState<T>) -> Result<FlowState<S>, FlowError> + Send + Sync + 'static,
  ) -> Self
  where
    S: 'static + Send + Sync,
  {
    self.branches.push(Arc::new(Branch {
      label: label.to_string(),
      condition: Arc::new(condition),
      sub_flow,
      extractor: Arc::new(extractor),
    }));
    self
  }

  /// Verdict used when no branch matches. Defaults to `Continue`.
  pub fn otherwise(mut self, control: FlowControl) -> Self {
    self.otherwise = control;
    self
  }

  /// Installs the dispatching handler as the stage's only `on` handler.
  ///
  /// When `optional` is true a failing branch is logged and the flow carries on.
  pub fn finalize(self, optional: bool) {
    let stage_name = self.stage.clone();
    let branches = Arc::new(self.branches);
    let otherwise = self.otherwise;
    let branch_count = branches.len();

    let dispatch: Handler<T, E> = Box::new(move |state: FlowState<T>| {
      let branches = branches.clone();
      let stage_name = stage_name.clone();
      Box::pin(async move {
        let picked = {
          let guard = state.read();
          branches.iter().find(|b| b.matches(&*guard)).cloned()
        };
        let Some(branch) = picked else {
          event!(Level::DEBUG, stage = %stage_name, verdict = ?otherwise, "No branch matched.");
          return Ok(otherwise);
        };

        event!(Level::DEBUG, stage = %stage_name, branch = branch.label(), "Branch matched.");
        match branch.execute(&stage_name, state).await {
          Ok(control) => Ok(control),
          Err(e) if optional => {
            event!(Level::WARN, stage = %stage_name, branch = branch.label(), error = %e, "Optional branch failed, continuing.");
            Ok(FlowControl::Continue)
          }
          Err(e) => Err(e),
        }
      })
    });

    self.flow.set_optional(&self.stage, optional);
    self.flow.on.insert(self.stage.clone(), vec![dispatch]);
    self.flow.branched.insert(self.stage.clone());
    event!(Level::DEBUG, stage = %self.stage, branches = branch_count, "Branches installed.");
  }
}
