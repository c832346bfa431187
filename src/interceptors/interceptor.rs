//! # Interceptor traits.
//!
//! Interceptors observe every publish call once, independent of how many
//! subscriptions receive the event.
//!
//! - [`Intercept`] - global interceptor, sees every event as an [`Envelope`]
//! - [`InterceptFor<E>`] - typed interceptor, sees only events of type `E`
//!
//! ## Rules
//! - `before_publish` returning `false` aborts the publish: no dispatch, no
//!   after-hooks, and the publish still returns `Ok(())`.
//! - `after_publish` always receives the envelope that was published, never the
//!   output of a transformer.
//! - Hooks run inside the publish call; a slow hook slows every publish.

use std::any::type_name;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::events::{Envelope, Event};

/// # Global publish interceptor.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use eventvisor::{Envelope, Intercept};
///
/// struct Audit;
///
/// #[async_trait]
/// impl Intercept for Audit {
///     async fn after_publish(&self, envelope: &Envelope, _token: &CancellationToken) {
///         println!("published #{} {}", envelope.seq, envelope.type_name());
///     }
///
///     fn name(&self) -> &str { "audit" }
/// }
/// ```
#[async_trait]
pub trait Intercept: Send + Sync + 'static {
    /// Runs before dispatch. Return `false` to stop the publish.
    async fn before_publish(&self, _envelope: &Envelope, _token: &CancellationToken) -> bool {
        true
    }

    /// Runs after dispatch with the originally published envelope.
    async fn after_publish(&self, _envelope: &Envelope, _token: &CancellationToken) {}

    /// Name used in logs and short-circuit reports.
    fn name(&self) -> &str {
        type_name::<Self>()
    }
}

/// # Interceptor scoped to one event type.
///
/// Registered through `Mediator::add_interceptor_for`. Events of other types
/// pass through untouched (as if `before_publish` returned `true`).
#[async_trait]
pub trait InterceptFor<E: Event>: Send + Sync + 'static {
    /// Runs before dispatch of an `E`. Return `false` to stop the publish.
    async fn before_publish(&self, _event: &E, _token: &CancellationToken) -> bool {
        true
    }

    /// Runs after dispatch with the originally published `E`.
    async fn after_publish(&self, _event: &E, _token: &CancellationToken) {}

    /// Name used in logs and short-circuit reports.
    fn name(&self) -> &str {
        type_name::<Self>()
    }
}
