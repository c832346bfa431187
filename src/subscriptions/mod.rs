//! # Subscriptions.
//!
//! - [`Subscription`] - disposable handle returned by `subscribe`
//! - `Registry` (crate-private) - per-type copy-on-write lists of handles

mod registry;
mod subscription;

pub(crate) use registry::Registry;
pub use subscription::Subscription;
