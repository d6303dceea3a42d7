use super::{run_isolated, PoolConfig, Scheduler, Task};
use parking_lot::{Condvar, Mutex};
use std::{
  collections::VecDeque,
  fmt::{Debug, Formatter},
  io,
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
  thread,
  time::Duration,
};
use tracing::debug;

/// Growing pool for blocking, I/O-bound work.
///
/// A task is handed to an idle worker when one is waiting; otherwise a new
/// worker thread is started for it. Workers that stay idle for `keep_alive`
/// retire, so the pool shrinks back to zero threads when unused. Tasks
/// submitted back to back may run concurrently and in any order.
#[derive(Clone)]
pub struct IoScheduler {
  inner: Arc<Inner>,
}

struct Inner {
  state: Mutex<State>,
  available: Condvar,
  keep_alive: Duration,
  name_prefix: String,
  spawned: AtomicUsize,
}

#[derive(Default)]
struct State {
  queue: VecDeque<Task>,
  // Workers blocked on `available`, including ones already woken that have
  // not re-taken the lock yet.
  idle: usize,
  workers: usize,
}

impl IoScheduler {
  /// A pool whose idle workers retire after 60 seconds.
  pub fn new() -> Self { Self::builder().create() }

  pub fn builder() -> IoSchedulerBuilder { IoSchedulerBuilder::default() }

  /// Number of live worker threads.
  pub fn worker_count(&self) -> usize { self.inner.state.lock().workers }

  fn spawn_worker(&self) -> io::Result<()> {
    let n = self.inner.spawned.fetch_add(1, Ordering::Relaxed);
    let inner = self.inner.clone();
    thread::Builder::new()
      .name(format!("{}{}", self.inner.name_prefix, n))
      .spawn(move || work(&inner))?;
    debug!(worker = n, "io scheduler worker started");
    Ok(())
  }
}

impl Default for IoScheduler {
  fn default() -> Self { Self::new() }
}

impl Scheduler for IoScheduler {
  fn execute(&self, task: Task) { self.submit(task, || self.spawn_worker()) }
}

impl IoScheduler {
  fn submit(&self, task: Task, spawn: impl FnOnce() -> io::Result<()>) {
    let grow = {
      let mut state = self.inner.state.lock();
      state.queue.push_back(task);
      if state.queue.len() > state.idle {
        state.workers += 1;
        true
      } else {
        self.inner.available.notify_one();
        false
      }
    };
    if grow {
      if let Err(err) = spawn() {
        // Counted before the spawn so a fast-retiring worker never underflows.
        self.inner.state.lock().workers -= 1;
        panic!("spawn worker for io scheduler failed: {err}");
      }
    }
  }
}

fn work(inner: &Inner) {
  let mut state = inner.state.lock();
  loop {
    if let Some(task) = state.queue.pop_front() {
      drop(state);
      run_isolated(task);
      state = inner.state.lock();
      continue;
    }

    state.idle += 1;
    let timed_out = inner
      .available
      .wait_for(&mut state, inner.keep_alive)
      .timed_out();
    state.idle -= 1;

    if timed_out && state.queue.is_empty() {
      state.workers -= 1;
      break;
    }
  }
  debug!(workers = state.workers, "io scheduler worker retired");
}

impl Debug for IoScheduler {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let state = self.inner.state.lock();
    f.debug_struct("IoScheduler")
      .field("workers", &state.workers)
      .field("idle", &state.idle)
      .field("queued", &state.queue.len())
      .field("keep_alive", &self.inner.keep_alive)
      .finish()
  }
}

/// Builder for [`IoScheduler`].
#[derive(Clone, Debug, Default)]
pub struct IoSchedulerBuilder {
  config: PoolConfig,
}

impl IoSchedulerBuilder {
  pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
    self.config.keep_alive = keep_alive;
    self
  }

  pub fn name_prefix(mut self, name_prefix: impl Into<String>) -> Self {
    self.config.name_prefix = Some(name_prefix.into());
    self
  }

  /// Starts no threads; workers are created on the first tasks.
  pub fn create(self) -> IoScheduler {
    let PoolConfig { name_prefix, keep_alive, .. } = self.config;
    debug!(?keep_alive, "io scheduler created");
    IoScheduler {
      inner: Arc::new(Inner {
        state: Mutex::new(State::default()),
        available: Condvar::new(),
        keep_alive,
        name_prefix: name_prefix.unwrap_or_else(|| "rxreplay-io-".to_owned()),
        spawned: AtomicUsize::new(0),
      }),
    }
  }
}
