//! # Sequential dispatch.
//!
//! Delivers to each subscription in registration order, awaiting each
//! delivery before starting the next.
//!
//! ## Rules
//! - Cancellation is checked before every delivery; once observed, the rest
//!   of the snapshot is skipped (reported as `DeliveryCancelled`).
//! - The first failure stops the loop and is returned unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::dispatch::dispatcher::{Dispatch, report_cancelled, report_failure};
use crate::dispatch::Strategy;
use crate::error::HandlerError;
use crate::events::{Bus, Envelope};
use crate::executors::Execute;
use crate::subscriptions::Subscription;

pub(crate) struct Sequential {
    executor: Arc<dyn Execute>,
    bus: Bus,
}

impl Sequential {
    pub(crate) fn new(executor: Arc<dyn Execute>, bus: Bus) -> Self {
        Self { executor, bus }
    }
}

#[async_trait]
impl Dispatch for Sequential {
    async fn dispatch(
        &self,
        envelope: &Envelope,
        subscriptions: Arc<[Subscription]>,
        token: &CancellationToken,
    ) -> Result<(), HandlerError> {
        for (idx, sub) in subscriptions.iter().enumerate() {
            if token.is_cancelled() {
                for skipped in &subscriptions[idx..] {
                    report_cancelled(&self.bus, Strategy::Sequential, envelope, skipped);
                }
                break;
            }
            if let Err(err) = self.executor.execute(envelope, sub, token).await {
                report_failure(&self.bus, Strategy::Sequential, envelope, sub, &err);
                return Err(err);
            }
        }
        Ok(())
    }

    fn strategy(&self) -> Strategy {
        Strategy::Sequential
    }
}
