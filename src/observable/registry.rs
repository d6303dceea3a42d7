//! Copy-on-write observer registry.
//!
//! Readers take a cheap `Arc` snapshot of the current registration list and
//! iterate it without holding any lock. Writers build a new list and swap it
//! in, so a fan-out round that already took its snapshot is unaffected by
//! registrations or removals that happen while it runs.

use crate::observer::Observer;
use parking_lot::Mutex;
use std::sync::Arc;

/// A registered observer, shared with whoever subscribed it.
pub(crate) type ObserverRef<Item, Err> = Arc<dyn Observer<Item, Err> + Send + Sync>;

pub(crate) type Snapshot<Item, Err> = Arc<[ObserverRef<Item, Err>]>;

pub(crate) struct Registry<Item, Err> {
  current: Mutex<Snapshot<Item, Err>>,
}

impl<Item, Err> Default for Registry<Item, Err> {
  fn default() -> Self { Registry { current: Mutex::new(Vec::new().into()) } }
}

impl<Item, Err> Registry<Item, Err> {
  #[inline]
  pub(crate) fn snapshot(&self) -> Snapshot<Item, Err> { self.current.lock().clone() }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.current.lock().len() }

  /// Append a registration. The same observer may be registered any number
  /// of times.
  pub(crate) fn add(&self, observer: ObserverRef<Item, Err>) {
    let mut current = self.current.lock();
    let mut next = Vec::with_capacity(current.len() + 1);
    next.extend(current.iter().cloned());
    next.push(observer);
    *current = next.into();
  }

  /// Remove the first registration of `observer`. Returns whether one was
  /// found.
  pub(crate) fn remove(&self, observer: &ObserverRef<Item, Err>) -> bool {
    let mut current = self.current.lock();
    let Some(idx) = current.iter().position(|o| same_observer(o, observer)) else {
      return false;
    };
    let next: Vec<_> = current
      .iter()
      .enumerate()
      .filter(|(i, _)| *i != idx)
      .map(|(_, o)| o.clone())
      .collect();
    *current = next.into();
    true
  }
}

/// Identity of a registration is the address of the shared observer; vtable
/// pointers are ignored.
fn same_observer<Item, Err>(a: &ObserverRef<Item, Err>, b: &ObserverRef<Item, Err>) -> bool {
  Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}
