//! Retry delay policies.
//!
//! This module groups the knobs that control **how long** a retrying executor
//! waits between attempts of a failed delivery.
//!
//! ## Contents
//! - [`BackoffPolicy`] how delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy to avoid synchronized retries
//!
//! ## Quick wiring
//! ```text
//! MediatorConfig { retries: Some(n), backoff: BackoffPolicy }
//!      └─► RetryExecutor uses backoff.next(retry) between attempts
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → constant 100ms, no jitter.
//! - `JitterPolicy::None`.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
