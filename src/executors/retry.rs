//! # Retrying executor.
//!
//! [`RetryExecutor`] wraps another [`Execute`] and repeats a failed delivery
//! up to a fixed number of attempts.
//!
//! ## Flow
//! ```text
//! for attempt in 1..=retries {
//!   ├─► token cancelled?        → stop, Ok(())
//!   ├─► inner.execute(..)
//!   │     ├─ Ok                 → Ok(())
//!   │     ├─ Err(not retryable) → return it
//!   │     ├─ Err(last attempt)  → return it
//!   │     └─ Err                → RetryScheduled, sleep(backoff.next(n))
//!   └─► continue
//! }
//! ```
//!
//! ## Rules
//! - `retries` counts attempts, not re-attempts: `retries = 1` runs once.
//! - `retries = 0` is rejected at construction time.
//! - The sleep between attempts does not observe cancellation; the token is
//!   checked again before the next attempt.
//! - The last failure is returned unchanged.
//! - Executors compose: wrapping a `RetryExecutor` in another multiplies the
//!   attempt budgets.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{HandlerError, MediatorError};
use crate::events::{Bus, Envelope, Report, ReportKind};
use crate::executors::{DirectExecutor, Execute};
use crate::policies::BackoffPolicy;
use crate::subscriptions::Subscription;

/// Executor that retries failed deliveries.
pub struct RetryExecutor {
    inner: Arc<dyn Execute>,
    retries: u32,
    backoff: BackoffPolicy,
    bus: Option<Bus>,
}

impl RetryExecutor {
    /// Retries direct handler invocation up to `retries` attempts with a fixed `delay`.
    ///
    /// # Errors
    /// [`MediatorError::InvalidArgument`] if `retries == 0`.
    pub fn new(retries: u32, delay: Duration) -> Result<Self, MediatorError> {
        Self::wrap(DirectExecutor::arc(), retries, delay)
    }

    /// Retries `inner` up to `retries` attempts with a fixed `delay`.
    ///
    /// # Errors
    /// [`MediatorError::InvalidArgument`] if `retries == 0`.
    pub fn wrap(
        inner: Arc<dyn Execute>,
        retries: u32,
        delay: Duration,
    ) -> Result<Self, MediatorError> {
        if retries == 0 {
            return Err(MediatorError::invalid("retries must be at least 1"));
        }
        Ok(Self {
            inner,
            retries,
            backoff: BackoffPolicy::constant(delay),
            bus: None,
        })
    }

    /// Replaces the fixed delay with a backoff policy.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Publishes `RetryScheduled` reports to `bus`.
    pub(crate) fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Maximum number of attempts per delivery.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    fn report(
        &self,
        envelope: &Envelope,
        sub: &Subscription,
        attempt: u32,
        delay: Duration,
        err: &HandlerError,
    ) {
        if let Some(bus) = &self.bus {
            bus.publish(
                Report::new(ReportKind::RetryScheduled)
                    .with_event_type(envelope.type_name())
                    .with_subscription(sub.id())
                    .with_attempt(attempt)
                    .with_delay(delay)
                    .with_reason(err.as_message()),
            );
        }
    }
}

/// Milliseconds for log fields, saturating at `u64::MAX`.
fn delay_millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl Execute for RetryExecutor {
    async fn execute(
        &self,
        envelope: &Envelope,
        subscription: &Subscription,
        token: &CancellationToken,
    ) -> Result<(), HandlerError> {
        for attempt in 1..=self.retries {
            if token.is_cancelled() {
                debug!(
                    subscription = subscription.id(),
                    attempt,
                    "retry loop stopped by cancellation"
                );
                break;
            }

            let err = match self.inner.execute(envelope, subscription, token).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };
            if !err.is_retryable() || attempt == self.retries {
                return Err(err);
            }

            let delay = self.backoff.next(attempt - 1);
            warn!(
                event_type = envelope.type_name(),
                subscription = subscription.id(),
                attempt,
                delay_ms = delay_millis(delay),
                reason = %err,
                "delivery failed, retrying"
            );
            self.report(envelope, subscription, attempt, delay, &err);
            time::sleep(delay).await;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "retry"
    }
}
