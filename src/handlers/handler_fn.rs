//! # Function-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(Arc<E>) -> Fut`, producing a fresh
//! future per delivery. Shared state goes into the closure explicitly
//! (`Arc<...>`); nothing is mutated between deliveries behind the caller's back.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use eventvisor::{Handle, HandlerError, HandlerFn};
//!
//! struct Tick(u64);
//!
//! let h = HandlerFn::arc("ticker", |ev: Arc<Tick>| async move {
//!     let _ = ev.0;
//!     Ok::<_, HandlerError>(())
//! });
//! assert_eq!(Handle::<Tick>::name(h.as_ref()), "ticker");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::events::Event;
use crate::handlers::handler::Handle;

/// Function-backed handler implementation.
#[derive(Debug)]
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<E, F, Fut> Handle<E> for HandlerFn<F>
where
    E: Event,
    F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, event: Arc<E>) -> Result<(), HandlerError> {
        (self.f)(event).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
