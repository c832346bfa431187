//! Mediator core: state, publish pipeline and construction.
//!
//! The public API from this module is [`Mediator`], its [`MediatorBuilder`]
//! and the [`Publisher`] / [`Subscriber`] facades.
//!
//! Internal modules:
//! - [`mediator`]: shared state and the publish pipeline;
//! - [`builder`]: composes config, executor stack and dispatcher;
//! - [`facade`]: publish-only and subscribe-only views.

mod builder;
mod facade;
mod mediator;

pub use builder::MediatorBuilder;
pub use facade::{Publisher, Subscriber};
pub use mediator::Mediator;
