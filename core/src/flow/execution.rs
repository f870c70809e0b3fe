// core/src/flow/execution.rs

//! `Flow::run`: walks the stages and drives their handlers.

use crate::error::FlowError;
use crate::flow::control::{FlowControl, FlowOutcome};
use crate::flow::definition::Flow;
use crate::flow::hooks::Phase;
use crate::flow::stage::StageDef;
use crate::flow::state::FlowState;
use tracing::{event, info_span, instrument, Instrument, Level};

const PHASES: [Phase; 3] = [Phase::Before, Phase::On, Phase::After];

impl<T, E> Flow<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every stage in order against `state`.
  ///
  /// Returns `Halted` as soon as a handler asks to halt, and the handler's error
  /// as soon as one fails. A required stage without handlers fails with
  /// `FlowError::HandlerMissing` converted into `E`.
  #[instrument(
    name = "Flow::run",
    skip_all,
    fields(state_type = %std::any::type_name::<T>(), stages = self.stages.len()),
    err(Display)
  )]
  pub async fn run(&self, state: FlowState<T>) -> Result<FlowOutcome, E> {
    event!(Level::DEBUG, "Flow starting.");
    for (idx, stage) in self.stages.iter().enumerate() {
      let span = info_span!("flow_stage", stage = stage.name.as_str(), index = idx, optional = stage.optional);
      match self.run_stage(stage, state.clone()).instrument(span).await? {
        FlowControl::Continue => {}
        FlowControl::Halt => {
          event!(Level::INFO, stage = %stage.name, "Flow halted.");
          return Ok(FlowOutcome::Halted);
        }
      }
    }
    event!(Level::DEBUG, "Flow completed.");
    Ok(FlowOutcome::Completed)
  }

  async fn run_stage(&self, stage: &StageDef<T>, state: FlowState<T>) -> Result<FlowControl, E> {
    if let Some(skip_if) = &stage.skip_if {
      let skip = {
        let guard = state.read();
        skip_if(&*guard)
      };
      if skip {
        event!(Level::INFO, "Stage skipped by its condition.");
        return Ok(FlowControl::Continue);
      }
    }

    let has_handlers = PHASES.iter().any(|phase| self.handlers(*phase, &stage.name).is_some());
    if !has_handlers {
      if stage.optional {
        event!(Level::DEBUG, "Optional stage has no handlers.");
        return Ok(FlowControl::Continue);
      }
      event!(Level::ERROR, "Required stage has no handlers.");
      return Err(E::from(FlowError::HandlerMissing {
        stage: stage.name.clone(),
      }));
    }

    for phase in PHASES {
      let Some(handlers) = self.handlers(phase, &stage.name) else {
        continue;
      };
      for (idx, handler) in handlers.iter().enumerate() {
        match handler(state.clone()).await {
          Ok(FlowControl::Continue) => {}
          Ok(FlowControl::Halt) => {
            event!(Level::DEBUG, phase = phase.label(), handler = idx, "Handler halted the flow.");
            return Ok(FlowControl::Halt);
          }
          Err(e) => {
            event!(Level::ERROR, phase = phase.label(), handler = idx, error = %e, "Handler failed.");
            return Err(e);
          }
        }
      }
    }
    Ok(FlowControl::Continue)
  }
}
