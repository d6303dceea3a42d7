//! Execution policies for replay and live delivery.
//!
//! A [`Scheduler`] accepts a unit of work and returns immediately. Three
//! policies are provided:
//!
//! | Scheduler | Workers | Ordering between submitted tasks |
//! |-----------|---------|----------------------------------|
//! | [`ComputationScheduler`] | fixed `N` | none |
//! | [`IoScheduler`] | grows on demand, idle workers retire | none |
//! | [`SingleThreadScheduler`] | exactly one | FIFO |
//!
//! No scheduler offers cancellation, timeouts or priorities. A panic inside a
//! task is reported by the process panic hook and ends only that task; the
//! worker goes on with the next one.

use std::{
  panic::{self, AssertUnwindSafe},
  sync::Arc,
  thread,
  time::Duration,
};

mod computation;
mod io;
mod single_thread;

pub use computation::{ComputationScheduler, ComputationSchedulerBuilder};
pub use io::{IoScheduler, IoSchedulerBuilder};
pub use single_thread::SingleThreadScheduler;

/// A unit of work handed to a [`Scheduler`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A Scheduler runs submitted tasks according to its execution policy.
pub trait Scheduler {
  /// Submit `task` and return without waiting for it to run.
  fn execute(&self, task: Task);
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
  #[inline]
  fn execute(&self, task: Task) { (**self).execute(task) }
}

impl<S: Scheduler + ?Sized> Scheduler for Box<S> {
  #[inline]
  fn execute(&self, task: Task) { (**self).execute(task) }
}

impl<S: Scheduler + ?Sized> Scheduler for &S {
  #[inline]
  fn execute(&self, task: Task) { (**self).execute(task) }
}

pub(crate) type SharedScheduler = Arc<dyn Scheduler + Send + Sync>;

/// Thread pool tuning shared by the scheduler builders.
#[derive(Clone, Debug)]
pub struct PoolConfig {
  /// Prefix for worker thread names; workers are numbered after it.
  pub name_prefix: Option<String>,
  /// Worker count of a fixed-size pool.
  pub pool_size: usize,
  /// How long an idle worker of a growing pool waits before it retires.
  pub keep_alive: Duration,
}

impl Default for PoolConfig {
  fn default() -> Self {
    PoolConfig {
      name_prefix: None,
      pool_size: thread::available_parallelism().map_or(1, |n| n.get()),
      keep_alive: Duration::from_secs(60),
    }
  }
}

/// Runs `task`, containing a panic to the task itself.
pub(crate) fn run_isolated(task: Task) {
  // The panic hook has already reported the failure.
  let _ = panic::catch_unwind(AssertUnwindSafe(task));
}

#[cfg(test)]
pub(crate) mod test_util {
  use std::{sync::mpsc::Receiver, time::Duration};

  pub(crate) const WAIT: Duration = Duration::from_secs(5);

  /// Collects `n` messages or fails the test after [`WAIT`].
  pub(crate) fn recv_n<T>(rx: &Receiver<T>, n: usize) -> Vec<T> {
    (0..n)
      .map(|i| {
        rx.recv_timeout(WAIT)
          .unwrap_or_else(|_| panic!("timed out waiting for message {i} of {n}"))
      })
      .collect()
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  struct Inline(AtomicUsize);

  impl Scheduler for Inline {
    fn execute(&self, task: Task) {
      self.0.fetch_add(1, Ordering::SeqCst);
      task();
    }
  }

  #[test]
  fn pointer_impls_forward() {
    let inline = Arc::new(Inline(AtomicUsize::new(0)));
    let hits = Arc::new(AtomicUsize::new(0));

    let erased: SharedScheduler = inline.clone();
    let boxed: Box<dyn Scheduler> = Box::new(inline.clone());
    for scheduler in [&erased as &dyn Scheduler, &boxed, &&*inline] {
      let c_hits = hits.clone();
      scheduler.execute(Box::new(move || {
        c_hits.fetch_add(1, Ordering::SeqCst);
      }));
    }

    assert_eq!(inline.0.load(Ordering::SeqCst), 3);
    assert_eq!(hits.load(Ordering::SeqCst), 3);
  }

  #[test]
  fn run_isolated_contains_panics() {
    run_isolated(Box::new(|| panic!("task failure")));
    let ran = Arc::new(AtomicUsize::new(0));
    let c_ran = ran.clone();
    run_isolated(Box::new(move || {
      c_ran.fetch_add(1, Ordering::SeqCst);
    }));
    assert_eq!(ran.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn default_config() {
    let config = PoolConfig::default();
    assert!(config.pool_size >= 1);
    assert_eq!(config.keep_alive, Duration::from_secs(60));
    assert!(config.name_prefix.is_none());
  }
}
