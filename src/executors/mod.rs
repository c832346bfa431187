//! # Delivery executors.
//!
//! - [`Execute`] - one delivery of one envelope to one subscription
//! - [`DirectExecutor`] - single attempt
//! - [`RetryExecutor`] - bounded retry around any other executor

mod execute;
mod retry;

pub use execute::{DirectExecutor, Execute};
pub use retry::RetryExecutor;
