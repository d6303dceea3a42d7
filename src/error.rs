//! Error types for scheduler construction.
//!
//! Stream errors are whatever `Err` type an [`Observable`] is declared with;
//! this module only covers failures that happen while building the thread
//! pools behind the schedulers.
//!
//! [`Observable`]: crate::observable::Observable

use std::io;

/// Errors that can occur while constructing a scheduler.
#[derive(Debug, thiserror::Error)]
pub enum RxError {
  /// The operating system refused to start the pool's worker threads.
  #[error("failed to build {kind} scheduler")]
  PoolBuild {
    /// Which scheduler was being built.
    kind: &'static str,
    /// Underlying spawn failure.
    #[source]
    source: io::Error,
  },

  /// A fixed-size pool was asked for zero workers.
  #[error("invalid pool size: {0} (must be at least 1)")]
  InvalidPoolSize(usize),
}
