//! # Mediator builder.
//!
//! [`MediatorBuilder`] is the static composition root: it validates the
//! config, assembles the executor stack and dispatcher, and registers
//! interceptors known up front.
//!
//! ```text
//! base executor (DirectExecutor | with_executor)
//!     └─► RetryExecutor (if cfg.retries is set)
//!           └─► dispatch::build(cfg.strategy)
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::config::MediatorConfig;
use crate::core::mediator::{Inner, Mediator};
use crate::dispatch;
use crate::error::MediatorError;
use crate::events::Bus;
use crate::executors::{DirectExecutor, Execute, RetryExecutor};
use crate::interceptors::{Chain, Intercept};
use crate::subscriptions::Registry;
use crate::transformers::Transformers;

/// Builder for constructing a [`Mediator`].
///
/// This is the static composition root: enumerate interceptors here, then
/// subscribe handlers on the built mediator.
pub struct MediatorBuilder {
    cfg: MediatorConfig,
    executor: Option<Arc<dyn Execute>>,
    interceptors: Vec<Arc<dyn Intercept>>,
}

impl MediatorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: MediatorConfig) -> Self {
        Self {
            cfg,
            executor: None,
            interceptors: Vec::new(),
        }
    }

    /// Sets the base executor used for each delivery.
    ///
    /// When `cfg.retries` is set, the retry wrapper is applied on top of this
    /// executor, so a custom [`RetryExecutor`] here nests inside it.
    pub fn with_executor(mut self, executor: Arc<dyn Execute>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Registers an interceptor before the mediator is built.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Intercept>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Builds the mediator.
    ///
    /// Initializes:
    /// - report bus (capacity clamped to 1)
    /// - executor stack (base executor, optional retry wrapper)
    /// - dispatcher for `cfg.strategy`
    /// - empty registry and transformer map, plus the builder's interceptors
    ///
    /// # Errors
    /// [`MediatorError::InvalidArgument`] if `cfg.retries == Some(0)`.
    pub fn build(self) -> Result<Mediator, MediatorError> {
        self.cfg.validate()?;
        let bus = Bus::new(self.cfg.bus_capacity_clamped());

        let base = self.executor.unwrap_or_else(DirectExecutor::arc);
        let executor: Arc<dyn Execute> = match self.cfg.retries {
            Some(retries) => Arc::new(
                RetryExecutor::wrap(base, retries, self.cfg.backoff.first)?
                    .with_backoff(self.cfg.backoff)
                    .with_bus(bus.clone()),
            ),
            None => base,
        };
        let dispatcher = dispatch::build(&self.cfg, Arc::clone(&executor), bus.clone());

        let interceptors = Chain::new();
        for i in self.interceptors {
            interceptors.push(i);
        }

        debug!(
            strategy = self.cfg.strategy.as_label(),
            executor = executor.name(),
            retries = ?self.cfg.retries,
            "mediator built"
        );
        Ok(Mediator::from_inner(Inner {
            cfg: self.cfg,
            bus,
            registry: Registry::new(),
            interceptors,
            transformers: Transformers::new(),
            dispatcher,
        }))
    }
}
