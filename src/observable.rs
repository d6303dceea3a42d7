//! The replaying observable.
//!
//! An [`Observable`] owns three things behind one lock: the history of
//! published values, the single mapper/filter slots, and the two write-once
//! scheduler slots. Registered observers live in a separate copy-on-write
//! [`registry`] so fan-out never holds a lock while calling into user code.
//!
//! # Ordering of `filter` and `map`
//!
//! The filter predicate is always tested against the raw value before the
//! mapper runs, whichever of the two was configured first:
//!
//! ```rust
//! # use rxreplay::prelude::*;
//! # use std::sync::{Arc, Mutex};
//! let source = Observable::<i32, ()>::create();
//! source.map(|v| v * 10).filter(|v| *v < 5);
//! source.send_new_value(3); // 3 < 5 passes, published as 30
//! source.send_new_value(7); // 7 < 5 fails, dropped
//!
//! let seen = Arc::new(Mutex::new(vec![]));
//! let c_seen = seen.clone();
//! source.subscribe_fn(move |v| c_seen.lock().unwrap().push(v));
//! assert_eq!(*seen.lock().unwrap(), vec![30]);
//! ```
//!
//! # Terminal events
//!
//! `complete_all` and `send_error_all` notify observers but do not close the
//! stream. Later values are still recorded and delivered.
//!
//! # Failures
//!
//! A panicking mapper, predicate or observer is not caught. With synchronous
//! delivery the panic unwinds into the caller and the rest of that fan-out
//! round is skipped. With a scheduler, the panic stays on the worker that ran
//! the delivery and sibling deliveries still happen.

use crate::{
  observer::{FnObserver, Observer},
  scheduler::{Scheduler, SharedScheduler},
  subscription::Subscription,
};
use parking_lot::Mutex;
use std::{
  fmt::{Debug, Formatter},
  sync::Arc,
};
use tracing::{debug, trace};

pub(crate) mod registry;

use registry::{ObserverRef, Registry, Snapshot};

type Mapper<Item> = Arc<dyn Fn(Item) -> Item + Send + Sync>;
type Predicate<Item> = Arc<dyn Fn(&Item) -> bool + Send + Sync>;

/// A push-based stream that records every accepted value and replays that
/// history to each new subscriber.
///
/// `Observable` is a handle: clones share the same history, observers and
/// configuration. Operators such as [`map`](Observable::map) and
/// [`filter`](Observable::filter) modify the observable in place and return
/// it again for chaining.
pub struct Observable<Item, Err> {
  core: Arc<Core<Item, Err>>,
}

struct Core<Item, Err> {
  state: Mutex<State<Item>>,
  observers: Registry<Item, Err>,
}

struct State<Item> {
  history: Vec<Item>,
  mapper: Option<Mapper<Item>>,
  predicate: Option<Predicate<Item>>,
  // Bumped by every `map`/`filter`. User closures run without the lock, so
  // this tells a writer whether the closures it ran are still current.
  generation: u64,
  subscribe_scheduler: Option<SharedScheduler>,
  observe_scheduler: Option<SharedScheduler>,
}

impl<Item> Default for State<Item> {
  fn default() -> Self {
    State {
      history: Vec::new(),
      mapper: None,
      predicate: None,
      generation: 0,
      subscribe_scheduler: None,
      observe_scheduler: None,
    }
  }
}

impl<Item> State<Item> {
  fn transforms(&self) -> Transforms<Item> {
    Transforms {
      mapper: self.mapper.clone(),
      predicate: self.predicate.clone(),
      generation: self.generation,
    }
  }
}

/// The mapper and predicate of one generation, detached from the lock.
struct Transforms<Item> {
  mapper: Option<Mapper<Item>>,
  predicate: Option<Predicate<Item>>,
  generation: u64,
}

impl<Item> Transforms<Item> {
  fn accepts(&self, value: &Item) -> bool { self.predicate.as_ref().map_or(true, |p| p(value)) }

  fn apply(&self, value: Item) -> Item {
    match &self.mapper {
      Some(mapper) => mapper(value),
      None => value,
    }
  }
}

impl<Item, Err> Clone for Observable<Item, Err> {
  #[inline]
  fn clone(&self) -> Self { Observable { core: self.core.clone() } }
}

impl<Item, Err> Observable<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  /// A new observable with no history, observers, operators or schedulers.
  pub fn create() -> Self {
    let core = Core { state: Mutex::new(State::default()), observers: Registry::default() };
    Observable { core: Arc::new(core) }
  }

  /// Publish `value` to the history and to every registered observer.
  ///
  /// The value is dropped without any effect if the filter predicate rejects
  /// it. Otherwise the mapper is applied, the result is appended to the
  /// history and delivered to the observers registered at this moment.
  ///
  /// The predicate and mapper run without any lock held, so they may call
  /// back into this observable. If `map` or `filter` replaces them
  /// meanwhile, the value is evaluated again with the new ones.
  pub fn send_new_value(&self, value: Item) {
    let mut transforms = self.core.state.lock().transforms();
    let (published, observers, scheduler) = loop {
      if !transforms.accepts(&value) {
        trace!("value rejected by filter");
        return;
      }
      let published = transforms.apply(value.clone());

      let mut state = self.core.state.lock();
      if state.generation == transforms.generation {
        state.history.push(published.clone());
        // Taken under the history lock so a concurrent subscriber gets this
        // value either through replay or through this round, never both.
        break (published, self.core.observers.snapshot(), state.observe_scheduler.clone());
      }
      trace!("transforms replaced while sending, evaluating again");
      transforms = state.transforms();
    };
    fan_out(observers, scheduler, published, |o, v| o.next(v));
  }

  /// Deliver a completion notification to every registered observer.
  ///
  /// History and registrations are kept; the observable stays usable.
  pub fn complete_all(&self) {
    let (observers, scheduler) = self.live_targets();
    fan_out(observers, scheduler, (), |o, ()| o.complete());
  }

  /// Deliver `err` to every registered observer.
  ///
  /// History and registrations are kept; the observable stays usable.
  pub fn send_error_all(&self, err: Err) {
    let (observers, scheduler) = self.live_targets();
    fan_out(observers, scheduler, err, |o, e| o.error(e));
  }

  /// Register `observer` and replay the current history to it.
  ///
  /// Registering the same observer twice yields two registrations and two
  /// deliveries per event. The returned [`Subscription`] removes exactly one
  /// of them.
  ///
  /// Replay runs inline unless a subscribe scheduler is set, in which case
  /// each replayed value is a separate task on that scheduler.
  pub fn subscribe<O>(&self, observer: Arc<O>) -> Subscription
  where
    O: Observer<Item, Err> + Send + Sync + 'static,
  {
    let observer: ObserverRef<Item, Err> = observer;
    let (replay, scheduler) = {
      let state = self.core.state.lock();
      self.core.observers.add(observer.clone());
      (state.history.clone(), state.subscribe_scheduler.clone())
    };
    trace!(replay = replay.len(), observers = self.core.observers.len(), "subscribed");

    match &scheduler {
      None => replay.into_iter().for_each(|v| observer.next(v)),
      Some(scheduler) => {
        for v in replay {
          let observer = observer.clone();
          scheduler.execute(Box::new(move || observer.next(v)));
        }
      }
    }

    let source = self.clone();
    Subscription::new(move || source.unregister(&observer))
  }

  /// Shorthand for subscribing a closure that only handles values.
  pub fn subscribe_fn<N>(&self, next: N) -> Subscription
  where
    N: Fn(Item) + Send + Sync + 'static,
  {
    self.subscribe(Arc::new(FnObserver::new(next)))
  }

  /// Set the mapper and rewrite the stored history with it.
  ///
  /// Observers are not re-notified about rewritten values. A later call
  /// replaces the mapper for new values but rewrites the already mapped
  /// history again.
  ///
  /// The rewrite runs on a copy of the history without any lock held and is
  /// stored only once every value has been mapped. If `f` panics, the panic
  /// reaches the caller, the history is left as it was and `f` stays
  /// installed for later values.
  pub fn map<F>(&self, f: F) -> &Self
  where
    F: Fn(Item) -> Item + Send + Sync + 'static,
  {
    let mapper: Mapper<Item> = Arc::new(f);
    let (stale, generation) = self.install(|state| state.mapper = Some(mapper.clone()));
    let rewritten: Vec<Item> = stale.into_iter().map(|v| mapper(v)).collect();

    let mut state = self.core.state.lock();
    if state.generation == generation {
      // Values appended since the copy was taken already went through `f`.
      for (slot, v) in state.history.iter_mut().zip(rewritten) {
        *slot = v;
      }
      trace!(history = state.history.len(), "mapper installed");
    } else {
      debug!("history rewrite superseded by a newer map or filter");
    }
    self
  }

  /// Set the filter predicate and drop every stored value it rejects.
  ///
  /// Observers are not re-notified. Relative order of the kept values is
  /// preserved. Like [`map`](Observable::map), the predicate runs without
  /// any lock held; if it panics, the history is left as it was.
  pub fn filter<F>(&self, f: F) -> &Self
  where
    F: Fn(&Item) -> bool + Send + Sync + 'static,
  {
    let predicate: Predicate<Item> = Arc::new(f);
    let (stale, generation) = self.install(|state| state.predicate = Some(predicate.clone()));
    let keep: Vec<bool> = stale.iter().map(|v| predicate(v)).collect();

    let mut state = self.core.state.lock();
    if state.generation == generation {
      // `retain` visits in order; values appended since the copy was taken
      // already passed the predicate.
      let mut keep = keep.into_iter();
      state.history.retain(|_| keep.next().unwrap_or(true));
      trace!(history = state.history.len(), "filter installed");
    } else {
      debug!("history rewrite superseded by a newer map or filter");
    }
    self
  }

  /// Run history replay and disposal on `scheduler`.
  ///
  /// Only the first call has an effect.
  pub fn subscribe_on<S>(&self, scheduler: S) -> &Self
  where
    S: Scheduler + Send + Sync + 'static,
  {
    let mut state = self.core.state.lock();
    if state.subscribe_scheduler.is_none() {
      state.subscribe_scheduler = Some(Arc::new(scheduler));
      debug!("subscribe scheduler set");
    } else {
      debug!("subscribe scheduler already set, ignoring");
    }
    self
  }

  /// Run live deliveries (`next`, `error`, `complete`) on `scheduler`.
  ///
  /// Only the first call has an effect.
  pub fn observe_on<S>(&self, scheduler: S) -> &Self
  where
    S: Scheduler + Send + Sync + 'static,
  {
    let mut state = self.core.state.lock();
    if state.observe_scheduler.is_none() {
      state.observe_scheduler = Some(Arc::new(scheduler));
      debug!("observe scheduler set");
    } else {
      debug!("observe scheduler already set, ignoring");
    }
    self
  }

  /// Project the current history through `f` into a new, independent
  /// observable.
  ///
  /// This is a one-shot copy: values sent to `self` afterwards never reach
  /// the returned observable.
  pub fn flat_map<R, F>(&self, mut f: F) -> Observable<R, Err>
  where
    R: Clone + Send + 'static,
    F: FnMut(Item) -> R,
  {
    let snapshot = self.core.state.lock().history.clone();
    let projected = Observable::create();
    for v in snapshot {
      projected.send_new_value(f(v));
    }
    projected
  }

  /// Number of live registrations.
  #[inline]
  pub fn subscribed_size(&self) -> usize { self.core.observers.len() }

  /// Store a new transform and return the history it has to be applied to,
  /// tagged with the generation it belongs to.
  fn install(&self, set: impl FnOnce(&mut State<Item>)) -> (Vec<Item>, u64) {
    let mut state = self.core.state.lock();
    set(&mut *state);
    state.generation += 1;
    (state.history.clone(), state.generation)
  }

  fn live_targets(&self) -> (Snapshot<Item, Err>, Option<SharedScheduler>) {
    let state = self.core.state.lock();
    (self.core.observers.snapshot(), state.observe_scheduler.clone())
  }

  fn unregister(&self, observer: &ObserverRef<Item, Err>) {
    let scheduler = self.core.state.lock().subscribe_scheduler.clone();
    match scheduler {
      None => {
        self.core.observers.remove(observer);
        trace!(observers = self.core.observers.len(), "disposed");
      }
      Some(scheduler) => {
        let core = self.core.clone();
        let observer = observer.clone();
        scheduler.execute(Box::new(move || {
          core.observers.remove(&observer);
          trace!(observers = core.observers.len(), "disposed");
        }));
      }
    }
  }
}

/// Deliver one event to every observer in `observers`.
///
/// Inline delivery clones `value` for all but the last observer. Scheduled
/// delivery submits one task per observer.
fn fan_out<Item, Err, V>(
  observers: Snapshot<Item, Err>,
  scheduler: Option<SharedScheduler>,
  value: V,
  deliver: fn(&ObserverRef<Item, Err>, V),
) where
  Item: 'static,
  Err: 'static,
  V: Clone + Send + 'static,
{
  trace!(observers = observers.len(), scheduled = scheduler.is_some(), "fan-out");
  match scheduler {
    None => {
      let mut iter = observers.iter().peekable();
      while let Some(observer) = iter.next() {
        if iter.peek().is_some() {
          deliver(observer, value.clone());
        } else {
          deliver(observer, value);
          break;
        }
      }
    }
    Some(scheduler) => {
      for observer in observers.iter() {
        let observer = observer.clone();
        let value = value.clone();
        scheduler.execute(Box::new(move || deliver(&observer, value)));
      }
    }
  }
}

impl<Item, Err> Debug for Observable<Item, Err> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let state = self.core.state.lock();
    f.debug_struct("Observable")
      .field("history_len", &state.history.len())
      .field("observers", &self.core.observers.len())
      .field("mapped", &state.mapper.is_some())
      .field("filtered", &state.predicate.is_some())
      .field("subscribe_on", &state.subscribe_scheduler.is_some())
      .field("observe_on", &state.observe_scheduler.is_some())
      .finish()
  }
}
