//! Example: the four observable scenarios
//!
//! 1. History replay to late subscribers.
//! 2. Retroactive `map` and `filter`.
//! 3. Replay and delivery on an I/O scheduler.
//! 4. `flat_map` plus disposing a subscription.
//!
//! Run with `RUST_LOG=debug` to also see the library's scheduler events.

use std::{fmt::Display, marker::PhantomData, sync::Arc, thread, time::Duration};

use rxreplay::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Observer that logs every event under its name.
struct Listener<T> {
  name: &'static str,
  _item: PhantomData<fn(T)>,
}

impl<T> Listener<T> {
  fn new(name: &'static str) -> Arc<Self> { Arc::new(Listener { name, _item: PhantomData }) }
}

impl<T: Display> Observer<T, String> for Listener<T> {
  fn next(&self, item: T) { info!("{} next: {}", self.name, item); }

  fn error(&self, err: String) { info!("{} error: {}", self.name, err); }

  fn complete(&self) { info!("{} complete", self.name); }
}

fn basic_replay() {
  info!("1. Basic functional demonstration");
  let strings = Observable::<String, String>::create();
  for word in ["Cool", "Stories", "Begin"] {
    strings.send_new_value(word.to_owned());
  }

  strings.subscribe(Listener::new("First Listener"));
  info!("Create first listener");
  strings.subscribe(Listener::new("Second Listener"));
  info!("Create second listener");

  strings.send_new_value("New message".to_owned());
  info!("Send new message");

  strings.subscribe(Listener::new("Third Listener"));
  info!("Create third listener");

  strings.complete_all();
}

fn map_and_filter() -> Observable<i32, String> {
  info!("2. Map and filter demonstration");
  let numbers = Observable::<i32, String>::create();
  numbers.send_new_value(1);
  numbers.send_new_value(2);

  numbers.subscribe(Listener::new("MapChecker1"));
  numbers.map(|i| i * 3);
  numbers.subscribe(Listener::new("MapChecker2"));
  numbers.send_new_value(3);

  numbers.filter(|i| i % 2 == 0);
  numbers.subscribe(Listener::new("FilterChecker1"));
  numbers.send_new_value(4);
  numbers.send_new_value(5);
  numbers
}

fn threads_control() {
  info!("3. Threads control");
  let strings = Observable::<String, String>::create();
  strings.subscribe_on(IoScheduler::new());
  strings.observe_on(IoScheduler::new());

  for word in ["One", "Two", "Three"] {
    strings.send_new_value(word.to_owned());
  }

  strings.subscribe(Listener::new("FirstThreadListener"));
  strings.subscribe(Listener::new("SecondThreadListener"));
  strings.subscribe(Listener::new("ThirdThreadListener"));

  strings.send_new_value("Four".to_owned());
  strings.send_new_value("Five".to_owned());

  // Deliveries run on pool workers; give them a moment before moving on.
  thread::sleep(Duration::from_millis(100));
}

fn operators_and_disposal(numbers: &Observable<i32, String>) {
  info!("4. Additional operators and subscribe control demonstration");
  let strings = numbers.flat_map(|num| format!("Number: {num}"));
  let control = strings.subscribe(Listener::new("IntegerToStringListener"));

  strings.send_new_value("Independent sender!!!".to_owned());
  strings.subscribe(Listener::new("IndependentListener"));
  strings.send_new_value("Last IntegerToStringListener message!".to_owned());

  control.dispose();
  strings.send_new_value("Only the independent listener is left".to_owned());
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_thread_names(true)
    .compact()
    .init();

  info!("App starts...");
  basic_replay();
  let numbers = map_and_filter();
  threads_control();
  operators_and_disposal(&numbers);
  info!("App DONE!");
}
