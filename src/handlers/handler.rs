//! # Handler abstraction.
//!
//! [`Handle<E>`] is the callback side of a subscription: it receives every
//! published `E` (or every value a transformer turned into an `E`).
//! Handlers are shared (`Arc`) and may be invoked concurrently by the
//! parallel, thread and pooled strategies.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::events::Event;

/// # Asynchronous event handler.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use eventvisor::{Handle, HandlerError};
///
/// struct OrderPlaced { id: u32 }
///
/// struct SendReceipt;
///
/// #[async_trait]
/// impl Handle<OrderPlaced> for SendReceipt {
///     async fn handle(&self, event: Arc<OrderPlaced>) -> Result<(), HandlerError> {
///         if event.id == 0 {
///             return Err(HandlerError::fatal("order without id"));
///         }
///         Ok(())
///     }
///
///     fn name(&self) -> &str { "send-receipt" }
/// }
/// ```
#[async_trait]
pub trait Handle<E: Event>: Send + Sync + 'static {
    /// Processes one delivery of `event`.
    ///
    /// Returning `Err` makes the delivery eligible for retry (see
    /// [`HandlerError::is_retryable`]); under blocking strategies the final
    /// error is returned to the publisher.
    async fn handle(&self, event: Arc<E>) -> Result<(), HandlerError>;

    /// Name used in logs and reports.
    ///
    /// The default is `type_name::<Self>()`, which can be verbose.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
