//! Published events and diagnostic reports.
//!
//! This module groups the **data model** of what flows through the mediator and
//! the **bus** used to observe what the engine did with it.
//!
//! ## Contents
//! - [`Event`], [`Envelope`] published values and their type-erased wrapper
//! - [`ReportKind`], [`Report`] diagnostic classification and metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast` carrying reports
//!
//! ## Quick reference
//! - **Report publishers**: `Mediator::publish`, dispatch strategies,
//!   `RetryExecutor`, pool workers (overflow/panic).
//! - **Report consumers**: anything holding `Mediator::reports()`.

mod bus;
mod event;
mod report;

pub use bus::Bus;
pub use event::{Envelope, Event};
pub use report::{Report, ReportKind};
