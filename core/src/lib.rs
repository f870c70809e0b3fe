// core/src/lib.rs

//! adaze-core: the engine and rules behind the ADAZE marketplace.
//!
//! Nothing in here does I/O. The crate provides:
//!  - A staged, async workflow engine ([`flow`]) with before/on/after handlers,
//!    optional and skippable stages, conditional branches over sub-states and a
//!    type-keyed registry.
//!  - Marketplace roles and the acting user.
//!  - The order status state machine and who may drive each edge.
//!  - Review rules: rating aggregation, sorting, edit/delete/respond gates and
//!    helpfulness voting.
//!  - Checkout planning (one order per seller, fees and commissions).
//!  - Dashboard and admin analytics over flattened order facts.
//!  - Platform settings.

pub mod analytics;
pub mod checkout;
pub mod error;
pub mod flow;
pub mod order;
pub mod review;
pub mod role;
pub mod settings;

pub use crate::error::{DomainError, DomainResult, FlowError, FlowResult};
pub use crate::flow::{BranchBuilder, Flow, FlowControl, FlowOutcome, FlowRegistry, FlowState, Handler, StageDef};
pub use crate::order::{OrderParties, OrderStatus, TransitionEffects};
pub use crate::review::{Rating, RatingSummary, ReviewSort, Vote};
pub use crate::role::{Actor, Role};
pub use crate::settings::PlatformSettings;

/*
    Typical use from the service layer:
    1. Define a state struct for the operation, e.g. `StatusChangeState`.
    2. Build a `Flow<StatusChangeState, AppError>` with its stages and attach
       handlers with `.before()`, `.on()`, `.after()`.
    3. Split a stage with `flow.branches_for_stage("name").when(..).finalize(..)`
       when part of the work only applies to some states.
    4. Register every flow once in a `FlowRegistry<AppError>` at startup.
    5. Per request: `registry.run(FlowState::new(state)).await`, then read the
       results back out of the `FlowState` handle you kept.
*/
