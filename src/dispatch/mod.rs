//! # Dispatch strategies.
//!
//! A strategy delivers one event to the snapshot of its subscriptions,
//! delegating each single delivery to an [`Execute`](crate::Execute)
//! implementation.
//!
//! - [`Strategy`] - public selector stored in `MediatorConfig`
//! - `Dispatch` (crate-private) - the seam the mediator calls through
//! - `sequential`, `chained`, `parallel`, `thread`, `pooled` - implementations

mod chained;
mod dispatcher;
mod parallel;
mod pooled;
mod sequential;
mod strategy;
mod thread;

use std::sync::Arc;

pub(crate) use dispatcher::Dispatch;
pub use strategy::Strategy;

use crate::config::MediatorConfig;
use crate::events::Bus;
use crate::executors::Execute;

/// Builds the dispatcher selected by `cfg.strategy`.
pub(crate) fn build(
    cfg: &MediatorConfig,
    executor: Arc<dyn Execute>,
    bus: Bus,
) -> Arc<dyn Dispatch> {
    match cfg.strategy {
        Strategy::Sequential => Arc::new(sequential::Sequential::new(executor, bus)),
        Strategy::Chained => Arc::new(chained::Chained::new(executor, bus)),
        Strategy::Parallel => Arc::new(parallel::Parallel::new(
            executor,
            bus,
            cfg.concurrency_limit(),
        )),
        Strategy::ThreadPerSubscriber => {
            Arc::new(thread::ThreadPerSubscriber::new(executor, bus))
        }
        Strategy::Pooled => Arc::new(pooled::Pooled::new(executor, bus, cfg.worker_count())),
    }
}
