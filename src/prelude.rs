//! Prelude module for convenient imports

pub use crate::error::RxError;
pub use crate::observable::Observable;
pub use crate::observer::{FnObserver, Observer};
pub use crate::scheduler::{
  ComputationScheduler, IoScheduler, PoolConfig, Scheduler, SingleThreadScheduler, Task,
};
pub use crate::subscription::{Disposable, Subscription, SubscriptionGuard};
