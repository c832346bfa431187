//! # Interceptor chain.
//!
//! Holds every registered interceptor in registration order. Each publish
//! loads one snapshot of the chain and runs it twice: before-hooks front to
//! back, then (unless short-circuited) after-hooks front to back again.
//! The phases are not mirror-nested.
//!
//! Registration is rare and reads happen on every publish, so the list lives
//! behind an [`ArcSwap`]: readers never lock, writers replace the whole list.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::events::Envelope;
use crate::interceptors::Intercept;

/// Snapshot of the chain taken by one publish call.
pub(crate) type ChainSnapshot = Arc<Vec<Arc<dyn Intercept>>>;

/// Copy-on-write list of interceptors.
pub(crate) struct Chain {
    list: ArcSwap<Vec<Arc<dyn Intercept>>>,
}

impl Chain {
    pub(crate) fn new() -> Self {
        Self {
            list: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Appends an interceptor; it runs after all earlier registrations.
    pub(crate) fn push(&self, interceptor: Arc<dyn Intercept>) {
        debug!(interceptor = interceptor.name(), "interceptor added");
        self.list.rcu(|cur| {
            let mut next = Vec::with_capacity(cur.len() + 1);
            next.extend(cur.iter().cloned());
            next.push(Arc::clone(&interceptor));
            Arc::new(next)
        });
    }

    pub(crate) fn snapshot(&self) -> ChainSnapshot {
        self.list.load_full()
    }

    pub(crate) fn len(&self) -> usize {
        self.list.load().len()
    }
}

/// Runs before-hooks in order.
///
/// Returns the name of the interceptor that stopped the publish, if any.
pub(crate) async fn run_before(
    chain: &[Arc<dyn Intercept>],
    envelope: &Envelope,
    token: &CancellationToken,
) -> Option<String> {
    for interceptor in chain {
        if !interceptor.before_publish(envelope, token).await {
            return Some(interceptor.name().to_string());
        }
    }
    None
}

/// Runs after-hooks in the same order as [`run_before`].
pub(crate) async fn run_after(
    chain: &[Arc<dyn Intercept>],
    envelope: &Envelope,
    token: &CancellationToken,
) {
    for interceptor in chain {
        interceptor.after_publish(envelope, token).await;
    }
}
