//! # Handler abstractions.
//!
//! This module provides the callback side of a subscription:
//! - [`Handle`] - trait for asynchronous typed handlers
//! - [`HandlerFn`] - closure-backed handler implementation
//! - `ErasedHandle` (crate-private) - type-erased adapter stored by the registry

mod erased;
mod handler;
mod handler_fn;

pub(crate) use erased::{ErasedHandle, HandlerFuture, Typed};
pub use handler::Handle;
pub use handler_fn::HandlerFn;
