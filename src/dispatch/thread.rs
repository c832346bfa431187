//! # Thread-per-subscriber dispatch.
//!
//! Starts one named OS thread per delivery and returns immediately. Each
//! thread drives its delivery on a private current-thread tokio runtime, so
//! it does not depend on the flavor of the caller's runtime.
//!
//! ## Rules
//! - Fire-and-forget: `dispatch` returns `Ok(())` once threads are started.
//! - The token is checked at the start of each thread; a cancelled delivery
//!   exits without invoking the handler.
//! - Failures and panics stay inside the thread; they are logged and
//!   published as reports, never returned to the publisher.

use std::sync::Arc;
use std::thread;

use async_trait::async_trait;
use tokio::runtime;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::dispatch::dispatcher::{Dispatch, report_cancelled, report_failure};
use crate::dispatch::Strategy;
use crate::error::HandlerError;
use crate::events::{Bus, Envelope};
use crate::executors::Execute;
use crate::subscriptions::Subscription;

pub(crate) struct ThreadPerSubscriber {
    executor: Arc<dyn Execute>,
    bus: Bus,
}

impl ThreadPerSubscriber {
    pub(crate) fn new(executor: Arc<dyn Execute>, bus: Bus) -> Self {
        Self { executor, bus }
    }
}

/// Body of one delivery thread.
fn deliver(
    executor: Arc<dyn Execute>,
    bus: Bus,
    envelope: Envelope,
    sub: Subscription,
    token: CancellationToken,
) {
    if token.is_cancelled() {
        report_cancelled(&bus, Strategy::ThreadPerSubscriber, &envelope, &sub);
        return;
    }

    let rt = match runtime::Builder::new_current_thread().enable_time().build() {
        Ok(rt) => rt,
        Err(e) => {
            let err = HandlerError::fail(format!("delivery runtime unavailable: {e}"));
            report_failure(&bus, Strategy::ThreadPerSubscriber, &envelope, &sub, &err);
            return;
        }
    };

    if let Err(err) = rt.block_on(executor.execute(&envelope, &sub, &token)) {
        report_failure(&bus, Strategy::ThreadPerSubscriber, &envelope, &sub, &err);
    }
}

#[async_trait]
impl Dispatch for ThreadPerSubscriber {
    async fn dispatch(
        &self,
        envelope: &Envelope,
        subscriptions: Arc<[Subscription]>,
        token: &CancellationToken,
    ) -> Result<(), HandlerError> {
        for sub in subscriptions.iter() {
            let executor = Arc::clone(&self.executor);
            let bus = self.bus.clone();
            let env = envelope.clone();
            let token = token.clone();
            let owned = sub.clone();

            let spawned = thread::Builder::new()
                .name(format!("eventvisor-sub-{}", sub.id()))
                .spawn(move || deliver(executor, bus, env, owned, token));
            if let Err(e) = spawned {
                warn!(subscription = sub.id(), error = %e, "failed to start delivery thread");
                let err = HandlerError::fail(format!("thread spawn failed: {e}"));
                report_failure(&self.bus, Strategy::ThreadPerSubscriber, envelope, sub, &err);
            }
        }
        Ok(())
    }

    fn strategy(&self) -> Strategy {
        Strategy::ThreadPerSubscriber
    }
}
