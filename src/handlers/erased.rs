//! Type-erased handler adapter.
//!
//! The registry stores handlers for many event types side by side, so each
//! typed [`Handle<E>`] is wrapped in an adapter that takes an [`Envelope`],
//! performs a checked downcast and only then calls the typed handler.
//!
//! The adapter is also the panic boundary: a panicking handler becomes
//! [`HandlerError::Panicked`] here, so every strategy and executor sees the
//! same error value.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state
//! inconsistent if a handler panics while holding a lock.

use std::any::type_name;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::HandlerError;
use crate::events::{Envelope, Event};
use crate::handlers::Handle;

/// Future returned by one type-erased delivery.
pub(crate) type HandlerFuture = BoxFuture<'static, Result<(), HandlerError>>;

/// Handler that accepts any envelope.
pub(crate) trait ErasedHandle: Send + Sync + 'static {
    /// Starts one delivery. The future owns everything it needs.
    fn call(&self, envelope: &Envelope) -> HandlerFuture;

    /// Name of the wrapped handler.
    fn name(&self) -> &str;
}

/// Adapter from `Handle<E>` to [`ErasedHandle`].
pub(crate) struct Typed<E, H: ?Sized> {
    handler: Arc<H>,
    _event: PhantomData<fn(E)>,
}

impl<E, H: ?Sized> Typed<E, H> {
    pub(crate) fn new(handler: Arc<H>) -> Self {
        Self {
            handler,
            _event: PhantomData,
        }
    }
}

impl<E, H> ErasedHandle for Typed<E, H>
where
    E: Event,
    H: Handle<E> + ?Sized,
{
    fn call(&self, envelope: &Envelope) -> HandlerFuture {
        let Some(event) = envelope.downcast_arc::<E>() else {
            let err = HandlerError::TypeMismatch {
                expected: type_name::<E>(),
                found: envelope.type_name(),
            };
            return Box::pin(async move { Err(err) });
        };
        let handler = Arc::clone(&self.handler);
        Box::pin(async move {
            AssertUnwindSafe(handler.handle(event))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(HandlerError::from_panic(&*panic)))
        })
    }

    fn name(&self) -> &str {
        self.handler.name()
    }
}
