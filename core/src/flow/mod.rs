//! Staged workflow engine.
//!
//! A [`Flow`] is an ordered list of named stages. Each stage carries `before`,
//! `on` and `after` handlers that run against a shared [`FlowState`]. Stages can
//! be optional, skipped by a predicate, or split into conditional branches that
//! run a sub-flow on an extracted sub-state. A [`FlowRegistry`] keys flows by
//! their state type so callers only need to hand over the state.

pub mod branch;
pub mod control;
pub mod definition;
pub mod execution;
pub mod handler;
pub mod hooks;
pub mod registry;
pub mod stage;
pub mod state;

pub use branch::BranchBuilder;
pub use control::{FlowControl, FlowOutcome};
pub use definition::Flow;
pub use handler::{Handler, HandlerFuture};
pub use registry::FlowRegistry;
pub use stage::{SkipCondition, StageDef};
pub use state::FlowState;
