//! # Parallel dispatch.
//!
//! Spawns one tokio task per subscription and waits until every started
//! delivery has finished.
//!
//! ## Architecture
//! ```text
//! for (idx, sub) in snapshot:
//!     acquire permit (optional, cancellable) ──► spawn ──► JoinSet
//!
//! join all ──► collect (idx, result) ──► first failure by idx
//! ```
//!
//! ## Rules
//! - `max_concurrency` bounds in-flight deliveries across all parallel
//!   publishes sharing this mediator (`None` = unlimited).
//! - Permits are acquired in registration order, so start order is
//!   deterministic under a limit; completion order is not.
//! - Cancellation skips deliveries that have not started; started ones run to
//!   completion.
//! - A panicking handler surfaces as `HandlerError::Panicked` like any other
//!   failure; a task lost to the runtime is reported the same way.
//! - Every started delivery finishes before the failure with the lowest index
//!   is returned.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::select;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::dispatch::dispatcher::{Dispatch, report_cancelled, report_failure};
use crate::dispatch::Strategy;
use crate::error::HandlerError;
use crate::events::{Bus, Envelope};
use crate::executors::Execute;
use crate::subscriptions::Subscription;

pub(crate) struct Parallel {
    executor: Arc<dyn Execute>,
    bus: Bus,
    semaphore: Option<Arc<Semaphore>>,
}

impl Parallel {
    pub(crate) fn new(executor: Arc<dyn Execute>, bus: Bus, limit: Option<usize>) -> Self {
        Self {
            executor,
            bus,
            semaphore: limit.map(|n| Arc::new(Semaphore::new(n))),
        }
    }

    /// Waits for a permit; `None` if cancelled first.
    async fn admit(
        &self,
        token: &CancellationToken,
    ) -> Option<Option<tokio::sync::OwnedSemaphorePermit>> {
        let Some(sem) = &self.semaphore else {
            return Some(None);
        };
        select! {
            biased;
            _ = token.cancelled() => None,
            permit = Arc::clone(sem).acquire_owned() => permit.ok().map(Some),
        }
    }
}

#[async_trait]
impl Dispatch for Parallel {
    async fn dispatch(
        &self,
        envelope: &Envelope,
        subscriptions: Arc<[Subscription]>,
        token: &CancellationToken,
    ) -> Result<(), HandlerError> {
        let mut set = JoinSet::new();

        for (idx, sub) in subscriptions.iter().enumerate() {
            let permit = match self.admit(token).await {
                Some(p) if !token.is_cancelled() => p,
                _ => {
                    for skipped in &subscriptions[idx..] {
                        report_cancelled(&self.bus, Strategy::Parallel, envelope, skipped);
                    }
                    break;
                }
            };

            let executor = Arc::clone(&self.executor);
            let envelope = envelope.clone();
            let sub = sub.clone();
            let token = token.clone();
            set.spawn(async move {
                let _permit = permit;
                (idx, executor.execute(&envelope, &sub, &token).await)
            });
        }

        let mut first: Option<(usize, HandlerError)> = None;
        while let Some(joined) = set.join_next().await {
            let (idx, err) = match joined {
                Ok((_, Ok(()))) => continue,
                Ok((idx, Err(err))) => (idx, err),
                Err(join_err) => {
                    // Task aborted by the runtime; the index is lost.
                    let err = HandlerError::Panicked {
                        reason: join_err.to_string(),
                    };
                    (usize::MAX, err)
                }
            };
            if let Some(sub) = subscriptions.get(idx) {
                report_failure(&self.bus, Strategy::Parallel, envelope, sub, &err);
            }
            if first.as_ref().is_none_or(|(best, _)| idx < *best) {
                first = Some((idx, err));
            }
        }

        match first {
            Some((_, err)) => Err(err),
            None => Ok(()),
        }
    }

    fn strategy(&self) -> Strategy {
        Strategy::Parallel
    }
}
