//! # Event transformers.
//!
//! Per-source-type rewriting applied between the before-hooks and dispatch.
//! Registered through `Mediator::add_transformer`.

mod registry;

pub(crate) use registry::Transformers;
