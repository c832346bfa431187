//! # Chained dispatch.
//!
//! Folds the snapshot into one future: each link awaits the previous link and
//! then delivers to its own subscription. The finished chain is awaited once.
//!
//! ```text
//! ready(Ok) ─► link(s1) ─► link(s2) ─► ... ─► link(sN) ─► await
//! ```
//!
//! Ordering, cancellation and failure behave like the sequential strategy:
//! each link checks the token before delivering, and a failed link
//! short-circuits every later one.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{self, BoxFuture, FutureExt};
use tokio_util::sync::CancellationToken;

use crate::dispatch::dispatcher::{Dispatch, report_cancelled, report_failure};
use crate::dispatch::Strategy;
use crate::error::HandlerError;
use crate::events::{Bus, Envelope};
use crate::executors::Execute;
use crate::subscriptions::Subscription;

pub(crate) struct Chained {
    executor: Arc<dyn Execute>,
    bus: Bus,
}

impl Chained {
    pub(crate) fn new(executor: Arc<dyn Execute>, bus: Bus) -> Self {
        Self { executor, bus }
    }

    fn link(
        &self,
        prev: BoxFuture<'static, Result<(), HandlerError>>,
        envelope: Envelope,
        sub: Subscription,
        token: CancellationToken,
    ) -> BoxFuture<'static, Result<(), HandlerError>> {
        let executor = Arc::clone(&self.executor);
        let bus = self.bus.clone();
        async move {
            prev.await?;
            if token.is_cancelled() {
                report_cancelled(&bus, Strategy::Chained, &envelope, &sub);
                return Ok(());
            }
            executor
                .execute(&envelope, &sub, &token)
                .await
                .inspect_err(|err| report_failure(&bus, Strategy::Chained, &envelope, &sub, err))
        }
        .boxed()
    }
}

#[async_trait]
impl Dispatch for Chained {
    async fn dispatch(
        &self,
        envelope: &Envelope,
        subscriptions: Arc<[Subscription]>,
        token: &CancellationToken,
    ) -> Result<(), HandlerError> {
        let chain = subscriptions
            .iter()
            .fold(future::ok::<(), HandlerError>(()).boxed(), |prev, sub| {
                self.link(prev, envelope.clone(), sub.clone(), token.clone())
            });
        chain.await
    }

    fn strategy(&self) -> Strategy {
        Strategy::Chained
    }
}
