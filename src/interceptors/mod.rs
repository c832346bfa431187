//! # Interceptors.
//!
//! Cross-cutting hooks run once per publish call:
//! - [`Intercept`] - global interceptor over type-erased envelopes
//! - [`InterceptFor`] - interceptor for a single event type
//! - `Chain` (crate-private) - ordered, lock-free-read storage

mod chain;
mod interceptor;
mod scoped;

pub(crate) use chain::{Chain, run_after, run_before};
pub use interceptor::{Intercept, InterceptFor};
pub(crate) use scoped::Scoped;
