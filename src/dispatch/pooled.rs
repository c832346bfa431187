//! # Pooled dispatch.
//!
//! Queues one job per subscription onto a shared queue drained by a fixed set
//! of worker tasks. `dispatch` never waits for a handler.
//!
//! ## Architecture
//! ```text
//! dispatch(env, [s1..sN])
//!     │ send(job) × N
//!     ▼
//! [unbounded mpsc queue] ──► worker 1 ──► executor.execute(s_i)
//!                     ├──► worker 2        └──► panic → HandlerPanicked
//!                     └──► worker W
//! ```
//!
//! ## Rules
//! - **Lazy start**: workers are spawned on the first dispatch, inside the
//!   caller's runtime.
//! - **No loss**: the queue is unbounded, so every dispatched job is delivered
//!   before shutdown completes. Jobs dispatched after shutdown are dropped and
//!   reported as `QueueOverflow` ("closed").
//! - **Isolation**: handler panics arrive as `HandlerError::Panicked`; jobs
//!   also run under `catch_unwind`, so a panicking executor never takes a
//!   worker down.
//! - **Cancellation**: checked when a worker picks the job up.
//! - **Shutdown**: closes the queue, lets workers drain queued jobs, joins them.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state
//! inconsistent if a handler panics while holding a lock.

use std::mem;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::dispatch::dispatcher::{Dispatch, report_cancelled, report_failure};
use crate::dispatch::Strategy;
use crate::error::HandlerError;
use crate::events::{Bus, Envelope, Report, ReportKind};
use crate::executors::Execute;
use crate::subscriptions::Subscription;

/// One queued delivery.
struct Job {
    envelope: Envelope,
    sub: Subscription,
    token: CancellationToken,
}

enum PoolState {
    Idle,
    Running {
        tx: mpsc::UnboundedSender<Job>,
        workers: Vec<JoinHandle<()>>,
    },
    Closed,
}

pub(crate) struct Pooled {
    executor: Arc<dyn Execute>,
    bus: Bus,
    workers: usize,
    state: Mutex<PoolState>,
}

impl Pooled {
    pub(crate) fn new(
        executor: Arc<dyn Execute>,
        bus: Bus,
        workers: usize,
    ) -> Self {
        Self {
            executor,
            bus,
            workers: workers.max(1),
            state: Mutex::new(PoolState::Idle),
        }
    }

    /// Returns a sender to the queue, starting workers if needed.
    fn sender(&self) -> Option<mpsc::UnboundedSender<Job>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match &*state {
            PoolState::Running { tx, .. } => return Some(tx.clone()),
            PoolState::Closed => return None,
            PoolState::Idle => {}
        }

        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let rx = Arc::new(AsyncMutex::new(rx));
        let workers = (0..self.workers)
            .map(|n| {
                let rx = Arc::clone(&rx);
                let executor = Arc::clone(&self.executor);
                let bus = self.bus.clone();
                tokio::spawn(worker(n, rx, executor, bus))
            })
            .collect();
        debug!(workers = self.workers, "worker pool started");

        *state = PoolState::Running {
            tx: tx.clone(),
            workers,
        };
        Some(tx)
    }

    fn overflow(&self, envelope: &Envelope, sub: &Subscription, reason: &'static str) {
        warn!(
            event_type = envelope.type_name(),
            subscription = sub.id(),
            reason,
            "delivery dropped by worker pool"
        );
        self.bus.publish(
            Report::new(ReportKind::QueueOverflow)
                .with_event_type(envelope.type_name())
                .with_subscription(sub.id())
                .with_reason(reason)
                .with_strategy(Strategy::Pooled.as_label()),
        );
    }
}

/// Pulls jobs until the queue is closed and drained.
async fn worker(
    n: usize,
    rx: Arc<AsyncMutex<mpsc::UnboundedReceiver<Job>>>,
    executor: Arc<dyn Execute>,
    bus: Bus,
) {
    loop {
        let next = rx.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };
        if job.token.is_cancelled() {
            report_cancelled(&bus, Strategy::Pooled, &job.envelope, &job.sub);
            continue;
        }

        let fut = executor.execute(&job.envelope, &job.sub, &job.token);
        let res = AssertUnwindSafe(fut)
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(HandlerError::from_panic(&*panic)));
        if let Err(err) = res {
            report_failure(&bus, Strategy::Pooled, &job.envelope, &job.sub, &err);
        }
    }
    debug!(worker = n, "pool worker stopped");
}

#[async_trait]
impl Dispatch for Pooled {
    async fn dispatch(
        &self,
        envelope: &Envelope,
        subscriptions: Arc<[Subscription]>,
        token: &CancellationToken,
    ) -> Result<(), HandlerError> {
        let Some(tx) = self.sender() else {
            for sub in subscriptions.iter() {
                self.overflow(envelope, sub, "closed");
            }
            return Ok(());
        };

        for sub in subscriptions.iter() {
            let job = Job {
                envelope: envelope.clone(),
                sub: sub.clone(),
                token: token.clone(),
            };
            if tx.send(job).is_err() {
                self.overflow(envelope, sub, "closed");
            }
        }
        Ok(())
    }

    fn strategy(&self) -> Strategy {
        Strategy::Pooled
    }

    async fn shutdown(&self) {
        let prev = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            mem::replace(&mut *state, PoolState::Closed)
        };
        if let PoolState::Running { tx, workers } = prev {
            drop(tx);
            for h in workers {
                let _ = h.await;
            }
            debug!("worker pool drained");
        }
    }
}
