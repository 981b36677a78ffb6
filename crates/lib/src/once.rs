//! Per-configuration memoization.
//!
//! Expensive values derived from product variables are computed at most once
//! per [`OnceCache`], no matter how many threads ask for them.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::debug;

type Slot = Arc<OnceLock<Arc<dyn Any + Send + Sync>>>;

/// Stable identifier for a memoized value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OnceKey(&'static str);

impl OnceKey {
  pub const fn new(key: &'static str) -> Self {
    Self(key)
  }

  pub fn as_str(&self) -> &'static str {
    self.0
  }
}

impl fmt::Display for OnceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.0)
  }
}

/// Keyed cache whose values are computed exactly once.
///
/// The map lock is only held while looking up the slot for a key, so slow
/// computations for different keys never block each other. Within one key,
/// [`OnceLock`] guarantees a single execution of the compute closure.
#[derive(Default)]
pub struct OnceCache {
  slots: Mutex<HashMap<OnceKey, Slot>>,
}

impl fmt::Debug for OnceCache {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    let keys: Vec<_> = slots.keys().map(OnceKey::as_str).collect();
    f.debug_struct("OnceCache").field("keys", &keys).finish()
  }
}

impl OnceCache {
  pub fn new() -> Self {
    Self::default()
  }

  fn slot(&self, key: OnceKey) -> Slot {
    let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(slots.entry(key).or_default())
  }

  /// Returns the value stored under `key`, computing it with `compute` on the
  /// first call.
  ///
  /// # Panics
  ///
  /// Panics if `key` already holds a value of a different type.
  pub fn once<T, F>(&self, key: OnceKey, compute: F) -> T
  where
    T: Clone + Send + Sync + 'static,
    F: FnOnce() -> T,
  {
    let slot = self.slot(key);
    let value = slot.get_or_init(|| {
      debug!(key = %key, "computing memoized value");
      Arc::new(compute())
    });
    downcast(key, value)
  }

  /// Returns the value stored under `key` if it was already computed.
  pub fn peek<T>(&self, key: OnceKey) -> Option<T>
  where
    T: Clone + Send + Sync + 'static,
  {
    let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    let value = slots.get(&key)?.get()?;
    Some(downcast(key, value))
  }
}

fn downcast<T: Clone + 'static>(key: OnceKey, value: &Arc<dyn Any + Send + Sync>) -> T {
  match value.downcast_ref::<T>() {
    Some(v) => v.clone(),
    None => panic!(
      "once key {key} holds a value of a different type than {}",
      std::any::type_name::<T>()
    ),
  }
}
