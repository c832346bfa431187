//! # Mediator configuration.
//!
//! [`MediatorConfig`] selects the dispatch strategy and the delivery policy
//! (retry budget, delay, pool sizing) for one mediator.
//!
//! Config is consumed once, by `MediatorBuilder::build`; changing it later
//! has no effect on a built mediator.
//!
//! ## Sentinel values
//! - `retries = None` → no retry wrapper (one attempt per delivery)
//! - `max_concurrency = 0` → unlimited parallel deliveries (no semaphore)
//! - `pool_workers = 0` → one worker per available CPU
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use eventvisor::{MediatorConfig, Strategy};
//!
//! let mut cfg = MediatorConfig::with_retries(3, Duration::from_millis(50));
//! cfg.strategy = Strategy::Parallel;
//! cfg.max_concurrency = 8;
//! cfg.fail_on_no_subscribers = true;
//!
//! assert_eq!(cfg.concurrency_limit(), Some(8));
//! assert!(cfg.validate().is_ok());
//! ```

use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

use crate::dispatch::Strategy;
use crate::error::MediatorError;
use crate::policies::BackoffPolicy;

/// Configuration for one mediator.
///
/// ## Field semantics
/// - `fail_on_no_subscribers`: publish returns `NoSubscribers` when nothing is registered
/// - `strategy`: concurrency model used for every publish
/// - `retries`: attempts per delivery (`None` = 1, no retry wrapper; `Some(0)` is invalid)
/// - `backoff`: delay between attempts (constant 100ms by default)
/// - `max_concurrency`: parallel in-flight limit (`0` = unlimited)
/// - `pool_workers`: pooled worker count (`0` = available parallelism)
/// - `bus_capacity`: report bus ring size (min 1)
#[derive(Clone, Debug)]
pub struct MediatorConfig {
    /// Fail publish with `NoSubscribers` if no subscription matches.
    pub fail_on_no_subscribers: bool,

    /// Dispatch strategy, fixed at build time.
    pub strategy: Strategy,

    /// Maximum attempts per delivery.
    ///
    /// Failures that are not retryable (`Fatal`, `TypeMismatch`) stop the
    /// loop on the first occurrence.
    pub retries: Option<u32>,

    /// Delay policy between attempts. Only used when `retries` is set.
    pub backoff: BackoffPolicy,

    /// Maximum deliveries in flight under [`Strategy::Parallel`].
    pub max_concurrency: usize,

    /// Worker count under [`Strategy::Pooled`].
    pub pool_workers: usize,

    /// Capacity of the report bus broadcast channel.
    ///
    /// Receivers lagging more than `bus_capacity` reports skip older items.
    pub bus_capacity: usize,
}

impl MediatorConfig {
    /// Default config with `retries` attempts and a constant `delay`.
    pub fn with_retries(retries: u32, delay: Duration) -> Self {
        Self {
            retries: Some(retries),
            backoff: BackoffPolicy::constant(delay),
            ..Self::default()
        }
    }

    /// Checks values that cannot be clamped.
    ///
    /// # Errors
    /// [`MediatorError::InvalidArgument`] if `retries == Some(0)`.
    pub fn validate(&self) -> Result<(), MediatorError> {
        if self.retries == Some(0) {
            return Err(MediatorError::invalid("retries must be at least 1"));
        }
        Ok(())
    }

    /// Returns the parallel concurrency limit as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` deliveries in flight
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrency == 0 {
            None
        } else {
            Some(self.max_concurrency)
        }
    }

    /// Returns the pool worker count, resolving `0` to available parallelism.
    pub fn worker_count(&self) -> usize {
        if self.pool_workers > 0 {
            return self.pool_workers;
        }
        thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    }

    /// Returns the bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for MediatorConfig {
    /// Default configuration:
    ///
    /// - `fail_on_no_subscribers = false`
    /// - `strategy = Strategy::Sequential`
    /// - `retries = None`
    /// - `backoff = BackoffPolicy::default()` (constant 100ms)
    /// - `max_concurrency = 0` (unlimited)
    /// - `pool_workers = 0` (available parallelism)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            fail_on_no_subscribers: false,
            strategy: Strategy::default(),
            retries: None,
            backoff: BackoffPolicy::default(),
            max_concurrency: 0,
            pool_workers: 0,
            bus_capacity: 1024,
        }
    }
}
