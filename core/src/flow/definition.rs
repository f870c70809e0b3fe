// core/src/flow/definition.rs

//! The `Flow<T, E>` type and the methods that shape its stage list.

use crate::error::FlowError;
use crate::flow::branch::BranchBuilder;
use crate::flow::handler::Handler;
use crate::flow::stage::{SkipCondition, StageDef};
use std::collections::{HashMap, HashSet};

/// An ordered set of stages over state `T` whose handlers fail with `E`.
///
/// `E` must absorb engine failures (`From<FlowError>`) so a run can report a
/// missing handler or a broken branch through the same error channel as the
/// handlers themselves.
pub struct Flow<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) stages: Vec<StageDef<T>>,
  pub(crate) before: HashMap<String, Vec<Handler<T, E>>>,
  pub(crate) on: HashMap<String, Vec<Handler<T, E>>>,
  pub(crate) after: HashMap<String, Vec<Handler<T, E>>>,
  pub(crate) branched: HashSet<String>,
}

impl<T, E> Flow<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Creates a flow from `(stage name, optional)` pairs, in execution order.
  pub fn new(stages: &[(&str, bool)]) -> Self {
    Self {
      stages: stages
        .iter()
        .map(|(name, optional)| StageDef::new(*name, *optional))
        .collect(),
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
      branched: HashSet::new(),
    }
  }

  pub fn stage_names(&self) -> Vec<&str> {
    self.stages.iter().map(|s| s.name.as_str()).collect()
  }

  pub fn has_stage(&self, name: &str) -> bool {
    self.stages.iter().any(|s| s.name == name)
  }

  pub fn is_branched(&self, name: &str) -> bool {
    self.branched.contains(name)
  }

  // Unknown or duplicate stage names are wiring mistakes, so they panic at setup
  // time instead of surfacing on the first request.
  fn stage_index(&self, name: &str) -> usize {
    match self.stages.iter().position(|s| s.name == name) {
      Some(idx) => idx,
      None => panic!("flow setup error: stage '{}' is not defined", name),
    }
  }

  pub(crate) fn ensure_stage_exists(&self, name: &str) {
    self.stage_index(name);
  }

  fn ensure_stage_absent(&self, name: &str) {
    if self.has_stage(name) {
      panic!("flow setup error: stage '{}' is already defined", name);
    }
  }

  pub fn insert_before(&mut self, existing: &str, name: impl Into<String>, optional: bool) {
    let idx = self.stage_index(existing);
    let name = name.into();
    self.ensure_stage_absent(&name);
    self.stages.insert(idx, StageDef::new(name, optional));
  }

  pub fn insert_after(&mut self, existing: &str, name: impl Into<String>, optional: bool) {
    let idx = self.stage_index(existing);
    let name = name.into();
    self.ensure_stage_absent(&name);
    self.stages.insert(idx + 1, StageDef::new(name, optional));
  }

  /// Drops a stage and every handler attached to it. Unknown names are ignored.
  pub fn remove_stage(&mut self, name: &str) {
    if let Some(idx) = self.stages.iter().position(|s| s.name == name) {
      self.stages.remove(idx);
      self.before.remove(name);
      self.on.remove(name);
      self.after.remove(name);
      self.branched.remove(name);
    }
  }

  pub fn set_optional(&mut self, name: &str, optional: bool) {
    let idx = self.stage_index(name);
    self.stages[idx].optional = optional;
  }

  pub fn set_skip_condition(&mut self, name: &str, skip_if: Option<SkipCondition<T>>) {
    let idx = self.stage_index(name);
    self.stages[idx].skip_if = skip_if;
  }

  /// Starts declaring conditional branches for `name`. The stage is appended if
  /// it does not exist yet.
  pub fn branches_for_stage(&mut self, name: &str) -> BranchBuilder<'_, T, E> {
    if !self.has_stage(name) {
      self.stages.push(StageDef::new(name, false));
    }
    BranchBuilder::new(self, name.to_string())
  }
}
