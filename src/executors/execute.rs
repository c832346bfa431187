//! # Single-delivery executor.
//!
//! An executor invokes one subscription for one event. Strategies decide
//! *which* subscriptions run and *how* concurrently; the executor decides
//! *how often* a single delivery is attempted.
//!
//! - [`Execute`] - the seam strategies call through
//! - [`DirectExecutor`] - one attempt, failure returned unchanged

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::HandlerError;
use crate::events::Envelope;
use crate::subscriptions::Subscription;

/// # Delivers one envelope to one subscription.
///
/// Implementations must be cheap to share: strategies hold them behind an
/// `Arc` and may call them from many tasks and threads at once.
///
/// A delivery is started with [`Subscription::invoke`]; wrappers either call
/// it directly or delegate to an inner executor, as [`RetryExecutor`] does.
///
/// [`RetryExecutor`]: crate::RetryExecutor
#[async_trait]
pub trait Execute: Send + Sync + 'static {
    /// Performs the delivery.
    ///
    /// Cancellation is cooperative: implementations may check `token` before
    /// starting work but never interrupt a handler mid-flight.
    async fn execute(
        &self,
        envelope: &Envelope,
        subscription: &Subscription,
        token: &CancellationToken,
    ) -> Result<(), HandlerError>;

    /// Short label for logs.
    fn name(&self) -> &'static str;
}

/// Invokes the handler exactly once.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectExecutor;

impl DirectExecutor {
    /// Returns the executor as a shared trait object.
    pub fn arc() -> Arc<dyn Execute> {
        Arc::new(Self)
    }
}

#[async_trait]
impl Execute for DirectExecutor {
    async fn execute(
        &self,
        envelope: &Envelope,
        subscription: &Subscription,
        _token: &CancellationToken,
    ) -> Result<(), HandlerError> {
        subscription.invoke(envelope).await
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}
