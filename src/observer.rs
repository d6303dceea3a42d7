//! Observer trait and implementations
//!
//! The Observer trait defines the consumer of data in the reactive pattern.
//! It provides three methods: next (for values), error (for errors), and
//! complete (for stream completion).
//!
//! An [`Observable`](crate::observable::Observable) holds observers behind a
//! shared pointer and may call them from several threads at once, so every
//! method takes `&self`. Observers that keep state use interior mutability.

use std::sync::Arc;

// ============================================================================
// Observer Trait
// ============================================================================

/// Observer trait: The consumer of data in reactive programming
///
/// Neither `error` nor `complete` is terminal. An observer may keep receiving
/// values after either of them.
pub trait Observer<Item, Err> {
  /// Receive the next value from the observable
  fn next(&self, value: Item);

  /// Handle an error from the observable
  fn error(&self, err: Err);

  /// Handle a completion notification from the observable
  fn complete(&self);
}

impl<Item, Err, O> Observer<Item, Err> for Arc<O>
where
  O: Observer<Item, Err> + ?Sized,
{
  #[inline]
  fn next(&self, value: Item) { (**self).next(value) }

  #[inline]
  fn error(&self, err: Err) { (**self).error(err) }

  #[inline]
  fn complete(&self) { (**self).complete() }
}

impl<Item, Err, O> Observer<Item, Err> for Box<O>
where
  O: Observer<Item, Err> + ?Sized,
{
  #[inline]
  fn next(&self, value: Item) { (**self).next(value) }

  #[inline]
  fn error(&self, err: Err) { (**self).error(err) }

  #[inline]
  fn complete(&self) { (**self).complete() }
}

// ============================================================================
// FnObserver - Closure adapter
// ============================================================================

/// Observer built from closures.
///
/// The `next` closure is required; `error` and `complete` default to
/// ignoring the event.
///
/// ```rust
/// # use rxreplay::prelude::*;
/// # use std::sync::Arc;
/// let observer = FnObserver::new(|v: i32| println!("value {v}"))
///   .on_error(|e: String| println!("error {e}"))
///   .on_complete(|| println!("complete"));
/// let source = Observable::<i32, String>::create();
/// source.subscribe(Arc::new(observer));
/// ```
pub struct FnObserver<N, Err> {
  next: N,
  error: Option<Box<dyn Fn(Err) + Send + Sync>>,
  complete: Option<Box<dyn Fn() + Send + Sync>>,
}

impl<N, Err> FnObserver<N, Err> {
  pub fn new(next: N) -> Self { FnObserver { next, error: None, complete: None } }

  /// Replace the error handler.
  pub fn on_error(mut self, error: impl Fn(Err) + Send + Sync + 'static) -> Self {
    self.error = Some(Box::new(error));
    self
  }

  /// Replace the completion handler.
  pub fn on_complete(mut self, complete: impl Fn() + Send + Sync + 'static) -> Self {
    self.complete = Some(Box::new(complete));
    self
  }
}

impl<Item, Err, N> Observer<Item, Err> for FnObserver<N, Err>
where
  N: Fn(Item),
{
  #[inline]
  fn next(&self, value: Item) { (self.next)(value) }

  fn error(&self, err: Err) {
    if let Some(error) = &self.error {
      error(err);
    }
  }

  fn complete(&self) {
    if let Some(complete) = &self.complete {
      complete();
    }
  }
}

// ============================================================================
// Tests
// ============================================================================
