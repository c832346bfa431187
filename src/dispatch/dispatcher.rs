//! # Dispatcher seam and shared delivery bookkeeping.
//!
//! Every strategy implements [`Dispatch`]. The helpers here keep logging and
//! report publishing identical across strategies.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::dispatch::Strategy;
use crate::error::HandlerError;
use crate::events::{Bus, Envelope, Report, ReportKind};
use crate::subscriptions::Subscription;

/// Delivers one envelope to a snapshot of subscriptions.
#[async_trait]
pub(crate) trait Dispatch: Send + Sync + 'static {
    /// Runs (or schedules) the deliveries.
    ///
    /// Blocking strategies return the first handler failure; fire-and-forget
    /// strategies always return `Ok(())` once deliveries are handed off.
    async fn dispatch(
        &self,
        envelope: &Envelope,
        subscriptions: Arc<[Subscription]>,
        token: &CancellationToken,
    ) -> Result<(), HandlerError>;

    fn strategy(&self) -> Strategy;

    /// Releases background resources. Default: nothing to release.
    async fn shutdown(&self) {}
}

/// Logs and reports a failed delivery.
pub(crate) fn report_failure(
    bus: &Bus,
    strategy: Strategy,
    envelope: &Envelope,
    sub: &Subscription,
    err: &HandlerError,
) {
    let kind = match err {
        HandlerError::Panicked { .. } => ReportKind::HandlerPanicked,
        _ => ReportKind::DeliveryFailed,
    };
    warn!(
        strategy = strategy.as_label(),
        event_type = envelope.type_name(),
        subscription = sub.id(),
        handler = sub.handler_name(),
        reason = %err,
        "delivery failed"
    );
    bus.publish(
        Report::new(kind)
            .with_event_type(envelope.type_name())
            .with_subscription(sub.id())
            .with_reason(err.as_message())
            .with_strategy(strategy.as_label()),
    );
}

/// Logs and reports a delivery skipped by cancellation.
pub(crate) fn report_cancelled(
    bus: &Bus,
    strategy: Strategy,
    envelope: &Envelope,
    sub: &Subscription,
) {
    debug!(
        strategy = strategy.as_label(),
        event_type = envelope.type_name(),
        subscription = sub.id(),
        "delivery cancelled"
    );
    bus.publish(
        Report::new(ReportKind::DeliveryCancelled)
            .with_event_type(envelope.type_name())
            .with_subscription(sub.id())
            .with_strategy(strategy.as_label()),
    );
}
