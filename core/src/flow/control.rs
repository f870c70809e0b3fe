// core/src/flow/control.rs

//! Verdicts returned by handlers and by whole flow runs.

/// What a handler wants the flow to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
  /// Keep going: remaining handlers of this stage, then the next stage.
  Continue,
  /// Stop right here. Nothing after this handler runs.
  Halt,
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
  /// Every stage that was not skipped ran to the end.
  Completed,
  /// A handler returned `FlowControl::Halt`.
  Halted,
}

impl FlowOutcome {
  pub fn is_completed(self) -> bool {
    matches!(self, FlowOutcome::Completed)
  }
}
