//! # Narrow views over a [`Mediator`].
//!
//! Application code that only publishes (or only subscribes) receives one of
//! these instead of the mediator, so it cannot register interceptors or
//! transformers.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::mediator::Mediator;
use crate::error::{HandlerError, MediatorError};
use crate::events::Event;
use crate::handlers::Handle;
use crate::subscriptions::Subscription;

/// Publish-only handle.
#[derive(Clone)]
pub struct Publisher {
    mediator: Mediator,
}

impl Publisher {
    pub(crate) fn new(mediator: Mediator) -> Self {
        Self { mediator }
    }

    /// See [`Mediator::publish`].
    ///
    /// # Errors
    /// Same as [`Mediator::publish`].
    pub async fn publish<E: Event>(&self, event: E) -> Result<(), MediatorError> {
        self.mediator.publish(event).await
    }

    /// See [`Mediator::publish_with`].
    ///
    /// # Errors
    /// Same as [`Mediator::publish`].
    pub async fn publish_with<E: Event>(
        &self,
        event: E,
        token: &CancellationToken,
    ) -> Result<(), MediatorError> {
        self.mediator.publish_with(event, token).await
    }
}

/// Subscribe-only handle.
#[derive(Clone)]
pub struct Subscriber {
    mediator: Mediator,
}

impl Subscriber {
    pub(crate) fn new(mediator: Mediator) -> Self {
        Self { mediator }
    }

    /// See [`Mediator::subscribe`].
    pub fn subscribe<E, H>(&self, handler: Arc<H>) -> Subscription
    where
        E: Event,
        H: Handle<E>,
    {
        self.mediator.subscribe::<E, H>(handler)
    }

    /// See [`Mediator::subscribe_fn`].
    pub fn subscribe_fn<E, F, Fut>(&self, name: impl Into<Cow<'static, str>>, f: F) -> Subscription
    where
        E: Event,
        F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.mediator.subscribe_fn(name, f)
    }

    /// See [`Mediator::unsubscribe`].
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        self.mediator.unsubscribe(subscription)
    }
}
