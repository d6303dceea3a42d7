use super::{run_isolated, Scheduler, Task};
use crate::error::RxError;
use futures::{executor::ThreadPool, future};
use tracing::debug;

/// One worker draining a FIFO queue.
///
/// This is the only scheduler that runs tasks in submission order: each
/// task is a future that completes on its first poll, and the single worker
/// polls them in the order they were queued.
#[derive(Clone, Debug)]
pub struct SingleThreadScheduler {
  pool: ThreadPool,
}

impl SingleThreadScheduler {
  pub fn new() -> Result<Self, RxError> { Self::build(None) }

  pub fn with_name_prefix(name_prefix: impl Into<String>) -> Result<Self, RxError> {
    Self::build(Some(name_prefix.into()))
  }

  fn build(name_prefix: Option<String>) -> Result<Self, RxError> {
    let mut builder = ThreadPool::builder();
    builder.pool_size(1);
    if let Some(prefix) = name_prefix {
      builder.name_prefix(prefix);
    }
    let pool = builder
      .create()
      .map_err(|source| RxError::PoolBuild { kind: "single-thread", source })?;
    debug!("single-thread scheduler started");
    Ok(SingleThreadScheduler { pool })
  }
}

impl Scheduler for SingleThreadScheduler {
  fn execute(&self, task: Task) { self.pool.spawn_ok(future::lazy(move |_| run_isolated(task))); }
}
