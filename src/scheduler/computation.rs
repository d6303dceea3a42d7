use super::{run_isolated, PoolConfig, Scheduler, Task};
use crate::error::RxError;
use futures::{executor::ThreadPool, future};
use tracing::debug;

/// Fixed-size pool for CPU-bound work.
///
/// Tasks are spread over `pool_size` workers, so two tasks submitted one
/// after the other may run in either order.
#[derive(Clone, Debug)]
pub struct ComputationScheduler {
  pool: ThreadPool,
  pool_size: usize,
}

impl ComputationScheduler {
  /// Build a pool with exactly `pool_size` workers.
  pub fn new(pool_size: usize) -> Result<Self, RxError> {
    Self::builder().pool_size(pool_size).create()
  }

  pub fn builder() -> ComputationSchedulerBuilder { ComputationSchedulerBuilder::default() }

  #[inline]
  pub fn pool_size(&self) -> usize { self.pool_size }
}

impl Scheduler for ComputationScheduler {
  fn execute(&self, task: Task) { self.pool.spawn_ok(future::lazy(move |_| run_isolated(task))); }
}

/// Builder for [`ComputationScheduler`]. Defaults to one worker per
/// available CPU.
#[derive(Clone, Debug, Default)]
pub struct ComputationSchedulerBuilder {
  config: PoolConfig,
}

impl ComputationSchedulerBuilder {
  pub fn pool_size(mut self, pool_size: usize) -> Self {
    self.config.pool_size = pool_size;
    self
  }

  pub fn name_prefix(mut self, name_prefix: impl Into<String>) -> Self {
    self.config.name_prefix = Some(name_prefix.into());
    self
  }

  pub fn create(self) -> Result<ComputationScheduler, RxError> {
    let PoolConfig { name_prefix, pool_size, .. } = self.config;
    if pool_size == 0 {
      return Err(RxError::InvalidPoolSize(pool_size));
    }
    let mut builder = ThreadPool::builder();
    builder.pool_size(pool_size);
    if let Some(prefix) = name_prefix {
      builder.name_prefix(prefix);
    }
    let pool = builder
      .create()
      .map_err(|source| RxError::PoolBuild { kind: "computation", source })?;
    debug!(pool_size, "computation scheduler started");
    Ok(ComputationScheduler { pool, pool_size })
  }
}
