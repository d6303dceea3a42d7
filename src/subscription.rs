use parking_lot::Mutex;
use std::fmt::{Debug, Formatter};

/// Handle returned from `Observable::subscribe` that revokes exactly one
/// observer registration.
pub trait Disposable {
  /// Remove the registration this handle was issued for. Calling it again is
  /// a no-op.
  ///
  /// Deliveries that were already scheduled for the observer still run.
  fn dispose(&self);

  fn is_disposed(&self) -> bool;
}

impl<T: Disposable + ?Sized> Disposable for Box<T> {
  #[inline]
  fn dispose(&self) { (**self).dispose() }

  #[inline]
  fn is_disposed(&self) -> bool { (**self).is_disposed() }
}

type TearDown = Box<dyn FnOnce() + Send + 'static>;

/// The concrete [`Disposable`] issued by an observable.
///
/// It keeps the observable alive until it is dropped, but dropping it does
/// not dispose; use [`Subscription::dispose_when_dropped`] for that.
pub struct Subscription {
  teardown: Mutex<Option<TearDown>>,
}

impl Subscription {
  pub(crate) fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
    Subscription { teardown: Mutex::new(Some(Box::new(teardown))) }
  }

  /// Activates "RAII" behavior for this subscription. That means
  /// `dispose()` will be called automatically as soon as the returned
  /// value goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `dispose()` is called immediately, which is probably not what you
  /// want!
  pub fn dispose_when_dropped(self) -> SubscriptionGuard<Self> { SubscriptionGuard(self) }
}

impl Disposable for Subscription {
  fn dispose(&self) {
    // Taken under the lock, run outside it: the teardown may reach back into
    // the observable.
    let teardown = self.teardown.lock().take();
    if let Some(teardown) = teardown {
      teardown();
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.teardown.lock().is_none() }
}

impl Debug for Subscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription")
      .field("is_disposed", &self.is_disposed())
      .finish()
  }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be disposed.
///
/// If you want to drop it immediately, wrap it in its own scope
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard<T: Disposable>(pub(crate) T);

impl<T: Disposable> SubscriptionGuard<T> {
  /// Wraps an existing subscription with a guard to enable RAII behavior for
  /// it.
  pub fn new(subscription: T) -> SubscriptionGuard<T> { SubscriptionGuard(subscription) }
}

impl<T: Disposable> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) { self.0.dispose() }
}

#[cfg(test)]
mod test {
  use super::*;
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  fn counting() -> (Subscription, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let c_calls = calls.clone();
    let subscription = Subscription::new(move || {
      c_calls.fetch_add(1, Ordering::SeqCst);
    });
    (subscription, calls)
  }

  #[test]
  fn dispose_is_idempotent() {
    let (subscription, calls) = counting();
    assert!(!subscription.is_disposed());
    subscription.dispose();
    subscription.dispose();
    subscription.dispose();
    assert!(subscription.is_disposed());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn dispose_from_many_threads_runs_once() {
    let (subscription, calls) = counting();
    let subscription = Arc::new(subscription);
    let handles: Vec<_> = (0..8)
      .map(|_| {
        let s = subscription.clone();
        std::thread::spawn(move || s.dispose())
      })
      .collect();
    for h in handles {
      h.join().unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn guard_disposes_on_drop() {
    let (subscription, calls) = counting();
    {
      let _guard = subscription.dispose_when_dropped();
      assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn boxed_disposable() {
    let (subscription, calls) = counting();
    let boxed: Box<dyn Disposable> = Box::new(subscription);
    boxed.dispose();
    boxed.dispose();
    assert!(boxed.is_disposed());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }
}
