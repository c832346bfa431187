//! # Published events and their type-erased envelope.
//!
//! Any `'static + Send + Sync` value is an [`Event`]; its concrete type is the
//! dispatch key. When published, the value is wrapped once in an [`Envelope`]
//! that carries:
//! - the shared value (`Arc<dyn Any + Send + Sync>`),
//! - its [`TypeId`] (registry key) and type name (errors, logs),
//! - a globally unique, monotonically increasing `seq`,
//! - a wall-clock timestamp `at`.
//!
//! Envelopes are cheap to clone; every clone shares the same value.
//!
//! ## Example
//! ```rust
//! use eventvisor::Envelope;
//!
//! #[derive(Debug, PartialEq)]
//! struct OrderPlaced { id: u32 }
//!
//! let env = Envelope::new(OrderPlaced { id: 7 });
//! assert!(env.is::<OrderPlaced>());
//! assert_eq!(env.downcast_ref::<OrderPlaced>(), Some(&OrderPlaced { id: 7 }));
//! assert!(env.downcast_ref::<String>().is_none());
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for published envelopes.
static ENVELOPE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Marker for values that can be published.
///
/// Implemented for every `T: Any + Send + Sync`; there is nothing to implement by hand.
pub trait Event: Any + Send + Sync + 'static {}

impl<T: Any + Send + Sync + 'static> Event for T {}

/// Type-erased published event.
#[derive(Clone)]
pub struct Envelope {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp taken when the envelope was created.
    pub at: SystemTime,

    type_id: TypeId,
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl Envelope {
    /// Wraps an event value.
    pub fn new<E: Event>(event: E) -> Self {
        Self::from_arc(Arc::new(event))
    }

    /// Wraps an already shared event value without copying it.
    pub fn from_arc<E: Event>(event: Arc<E>) -> Self {
        Self {
            seq: ENVELOPE_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            type_id: TypeId::of::<E>(),
            type_name: std::any::type_name::<E>(),
            value: event,
        }
    }

    /// Dispatch key of the wrapped value.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Type name of the wrapped value.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the wrapped value is an `E`.
    #[inline]
    pub fn is<E: Event>(&self) -> bool {
        self.type_id == TypeId::of::<E>()
    }

    /// Borrows the wrapped value as `E`, if it is one.
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.value.downcast_ref::<E>()
    }

    /// Returns a shared handle to the wrapped value as `E`, if it is one.
    pub fn downcast_arc<E: Event>(&self) -> Option<Arc<E>> {
        Arc::clone(&self.value).downcast::<E>().ok()
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("seq", &self.seq)
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}
