//! # Subscription handle.
//!
//! A [`Subscription`] represents one handler registered for one event type.
//! It is created `Active` by `Mediator::subscribe` and becomes `Disposed`
//! exactly once, on the first successful [`Subscription::dispose`] (or
//! `Mediator::unsubscribe`). Later calls are no-ops that return `false`.
//!
//! ## Rules
//! - Handles are cheap to clone; all clones refer to the same registration.
//! - Dropping a handle does **not** unsubscribe (registrations live for the
//!   mediator's lifetime unless disposed).
//! - The handle holds a `Weak` reference to the registry; disposing after the
//!   mediator is gone returns `false`.
//! - Disposal never affects a dispatch that already snapshotted the list.

use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures::future::BoxFuture;

use crate::error::HandlerError;
use crate::events::Envelope;
use crate::handlers::ErasedHandle;
use crate::subscriptions::registry::Registry;

/// Global counter for subscription ids.
static SUBSCRIPTION_SEQ: AtomicU64 = AtomicU64::new(1);

/// Shared state behind every clone of a handle.
struct Inner {
    id: u64,
    type_id: TypeId,
    type_name: &'static str,
    handler: Box<dyn ErasedHandle>,
    active: AtomicBool,
}

/// Disposable handle to one registered handler.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<Inner>,
    registry: Weak<Registry>,
}

impl Subscription {
    pub(crate) fn new(
        registry: Weak<Registry>,
        type_id: TypeId,
        type_name: &'static str,
        handler: Box<dyn ErasedHandle>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: SUBSCRIPTION_SEQ.fetch_add(1, Ordering::Relaxed),
                type_id,
                type_name,
                handler,
                active: AtomicBool::new(true),
            }),
            registry,
        }
    }

    /// Unique id of this registration.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Type name of the event this handler receives.
    pub fn event_type(&self) -> &'static str {
        self.inner.type_name
    }

    /// Name of the registered handler.
    pub fn handler_name(&self) -> &str {
        self.inner.handler.name()
    }

    /// `true` until the subscription is disposed.
    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::Acquire)
    }

    /// Removes the registration from its mediator.
    ///
    /// Returns `true` only for the call that actually removed it.
    pub fn dispose(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(self),
            None => false,
        }
    }

    /// Starts one delivery of `envelope` to the handler.
    ///
    /// This is the primitive custom [`Execute`](crate::Execute) implementations
    /// build on. It ignores disposal and cancellation; a panicking handler
    /// resolves to [`HandlerError::Panicked`](crate::HandlerError::Panicked).
    pub fn invoke(&self, envelope: &Envelope) -> BoxFuture<'static, Result<(), HandlerError>> {
        self.inner.handler.call(envelope)
    }

    pub(crate) fn type_id(&self) -> TypeId {
        self.inner.type_id
    }

    /// Flips `Active → Disposed`; returns `false` if already disposed.
    pub(crate) fn deactivate(&self) -> bool {
        self.inner.active.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn belongs_to(&self, registry: &Registry) -> bool {
        std::ptr::eq(self.registry.as_ptr(), registry)
    }
}

impl PartialEq for Subscription {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Subscription {}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.inner.id, self.inner.type_name)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.inner.id)
            .field("event_type", &self.inner.type_name)
            .field("handler", &self.inner.handler.name())
            .field("active", &self.is_active())
            .finish()
    }
}
