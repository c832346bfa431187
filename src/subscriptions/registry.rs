//! # Subscription registry - per-type, copy-on-write handler lists.
//!
//! The registry maps an event [`TypeId`] to the ordered list of subscriptions
//! registered for that type. Insertion order is delivery order for the
//! order-preserving strategies.
//!
//! ## Architecture
//! ```text
//! DashMap<TypeId, Arc<[Subscription]>>
//!   insert(T, s)  → rebuild T's list with s appended   (shard write lock)
//!   remove(s)     → rebuild T's list without s         (shard write lock)
//!   snapshot(T)   → clone the Arc                      (shard read lock)
//! ```
//!
//! ## Rules
//! - Lists are never mutated in place; writers publish a new `Arc<[_]>`.
//! - A snapshot is immutable: adds/removes after it is taken do not affect it.
//! - Locks are sharded per key; writers for one type do not block others.
//! - Empty lists are dropped, so "no entry" and "no subscribers" coincide.

use std::any::{TypeId, type_name};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::events::Event;
use crate::handlers::{Handle, Typed};
use crate::subscriptions::Subscription;

/// Concurrent map of event type to subscription list.
#[derive(Default)]
pub(crate) struct Registry {
    lists: DashMap<TypeId, Arc<[Subscription]>>,
}

impl Registry {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Appends a handler to `E`'s list and returns its handle.
    pub(crate) fn insert<E, H>(self: &Arc<Self>, handler: Arc<H>) -> Subscription
    where
        E: Event,
        H: Handle<E> + ?Sized,
    {
        let sub = Subscription::new(
            Arc::downgrade(self),
            TypeId::of::<E>(),
            type_name::<E>(),
            Box::new(Typed::<E, H>::new(handler)),
        );

        self.lists
            .entry(sub.type_id())
            .and_modify(|list| {
                let mut next = Vec::with_capacity(list.len() + 1);
                next.extend(list.iter().cloned());
                next.push(sub.clone());
                *list = next.into();
            })
            .or_insert_with(|| Arc::from(vec![sub.clone()]));

        debug!(
            subscription = sub.id(),
            event_type = sub.event_type(),
            handler = sub.handler_name(),
            "subscribed"
        );
        sub
    }

    /// Removes `sub` from its list. Idempotent.
    pub(crate) fn remove(&self, sub: &Subscription) -> bool {
        if !sub.belongs_to(self) || !sub.deactivate() {
            return false;
        }

        let key = sub.type_id();
        let removed = match self.lists.get_mut(&key) {
            Some(mut list) => {
                let next: Vec<Subscription> =
                    list.iter().filter(|s| *s != sub).cloned().collect();
                let removed = next.len() != list.len();
                *list = next.into();
                removed
            }
            None => false,
        };
        self.lists.remove_if(&key, |_, list| list.is_empty());

        debug!(
            subscription = sub.id(),
            event_type = sub.event_type(),
            removed,
            "unsubscribed"
        );
        removed
    }

    /// Immutable view of the current list for `key`, or `None` if empty.
    pub(crate) fn snapshot(&self, key: TypeId) -> Option<Arc<[Subscription]>> {
        self.lists
            .get(&key)
            .map(|list| Arc::clone(list.value()))
            .filter(|list| !list.is_empty())
    }

    /// Number of active subscriptions for `key`.
    pub(crate) fn count(&self, key: TypeId) -> usize {
        self.lists.get(&key).map_or(0, |list| list.len())
    }
}
