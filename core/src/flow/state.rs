// core/src/flow/state.rs

use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Shared, lockable state threaded through every stage of a flow.
///
/// Cloning hands out another handle to the same state, so a caller can keep a
/// clone and read the results once the flow returns.
///
/// The guards are blocking `parking_lot` guards. Drop them before any `.await`.
#[derive(Debug)]
pub struct FlowState<T: Send + Sync + 'static>(Arc<RwLock<T>>);

impl<T: Send + Sync + 'static> FlowState<T> {
  pub fn new(data: T) -> Self {
    FlowState(Arc::new(RwLock::new(data)))
  }

  pub fn read(&self) -> RwLockReadGuard<'_, T> {
    self.0.read()
  }

  pub fn write(&self) -> RwLockWriteGuard<'_, T> {
    self.0.write()
  }

  pub fn try_read(&self) -> Option<RwLockReadGuard<'_, T>> {
    self.0.try_read()
  }

  pub fn try_write(&self) -> Option<RwLockWriteGuard<'_, T>> {
    self.0.try_write()
  }

  /// Read guard narrowed to one part of the state, e.g. `state.map_read(|s| &s.lines)`.
  pub fn map_read<F, U: ?Sized>(&self, f: F) -> MappedRwLockReadGuard<'_, U>
  where
    F: FnOnce(&T) -> &U,
  {
    RwLockReadGuard::map(self.read(), f)
  }

  pub fn map_write<F, U: ?Sized>(&self, f: F) -> MappedRwLockWriteGuard<'_, U>
  where
    F: FnOnce(&mut T) -> &mut U,
  {
    RwLockWriteGuard::map(self.write(), f)
  }

  /// True when both handles point at the same state.
  pub fn same_as(&self, other: &FlowState<T>) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
  }
}

impl<T: Send + Sync + 'static> Clone for FlowState<T> {
  fn clone(&self) -> Self {
    FlowState(Arc::clone(&self.0))
  }
}

impl<T: Send + Sync + 'static + Default> Default for FlowState<T> {
  fn default() -> Self {
    Self::new(Default::default())
  }
}
