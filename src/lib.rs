//! # rxreplay: a replaying observable
//!
//! A single push-based stream primitive, [`Observable`], that remembers every
//! value it has accepted and replays that history to observers attached
//! later.
//!
//! ```rust
//! use rxreplay::prelude::*;
//! use std::sync::{Arc, Mutex};
//!
//! let numbers = Observable::<i32, String>::create();
//! numbers.send_new_value(1);
//! numbers.send_new_value(2);
//!
//! let seen = Arc::new(Mutex::new(vec![]));
//! let c_seen = seen.clone();
//! numbers.map(|v| v * 3);
//! numbers.subscribe_fn(move |v| c_seen.lock().unwrap().push(v));
//! numbers.send_new_value(3);
//!
//! assert_eq!(*seen.lock().unwrap(), vec![3, 6, 9]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | Buffers history, applies `map`/`filter`, fans events out |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Disposable`] | One-shot handle that removes a registration |
//! | [`Scheduler`] | Execution policy for replay and live delivery |
//!
//! ## Semantics worth knowing
//!
//! - `complete_all` and `send_error_all` are **not terminal**: values sent
//!   afterwards are still recorded and delivered.
//! - The filter predicate always sees the raw value, before the mapper runs,
//!   whichever of `map`/`filter` was configured first.
//! - `map` and `filter` mutate the observable they are called on and rewrite
//!   the stored history; already registered observers are not re-notified.
//! - `flat_map` is a one-shot projection of the current history, not a live
//!   operator.
//! - Only synchronous delivery and [`SingleThreadScheduler`] keep per-observer
//!   ordering. Pool schedulers may reorder deliveries.
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Disposable`]: subscription::Disposable
//! [`Scheduler`]: scheduler::Scheduler
//! [`SingleThreadScheduler`]: scheduler::SingleThreadScheduler

pub mod error;
pub mod observable;
pub mod observer;
pub mod prelude;
pub mod scheduler;
pub mod subscription;

pub use prelude::*;
