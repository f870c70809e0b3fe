// core/src/flow/handler.rs

use crate::flow::control::FlowControl;
use crate::flow::state::FlowState;
use std::future::Future;
use std::pin::Pin;

pub type HandlerFuture<E> = Pin<Box<dyn Future<Output = Result<FlowControl, E>> + Send>>;

/// A stage handler. It receives its own handle to the flow state and must not
/// hold a lock guard across an `.await`.
pub type Handler<T, E> = Box<dyn Fn(FlowState<T>) -> HandlerFuture<E> + Send + Sync>;
