//! Adapter from a typed [`InterceptFor<E>`] to a global [`Intercept`].

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::events::{Envelope, Event};
use crate::interceptors::{Intercept, InterceptFor};

/// Filters envelopes by type before calling the typed interceptor.
pub(crate) struct Scoped<E, I: ?Sized> {
    inner: Arc<I>,
    _event: PhantomData<fn(E)>,
}

impl<E, I: ?Sized> Scoped<E, I> {
    pub(crate) fn new(inner: Arc<I>) -> Self {
        Self {
            inner,
            _event: PhantomData,
        }
    }
}

#[async_trait]
impl<E, I> Intercept for Scoped<E, I>
where
    E: Event,
    I: InterceptFor<E> + ?Sized,
{
    async fn before_publish(&self, envelope: &Envelope, token: &CancellationToken) -> bool {
        match envelope.downcast_ref::<E>() {
            Some(event) => self.inner.before_publish(event, token).await,
            None => true,
        }
    }

    async fn after_publish(&self, envelope: &Envelope, token: &CancellationToken) {
        if let Some(event) = envelope.downcast_ref::<E>() {
            self.inner.after_publish(event, token).await;
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
