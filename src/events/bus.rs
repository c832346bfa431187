//! # Report bus for broadcasting diagnostics.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking report publishing from many sources (mediator, strategies,
//! executors, pool workers).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                  Receivers (any number):
//!   Mediator    ──┐
//!   Strategies  ──┼──────► Bus ───────► Mediator::reports()
//!   Executors   ──┤  (broadcast chan)
//!   Pool worker ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; it calls `broadcast::Sender::send`.
//! - **Bounded capacity**: a single ring buffer stores recent reports for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: reports are lost if there are no active receivers at send time.

use tokio::sync::broadcast;
use tracing::trace;

use super::report::Report;

/// Broadcast channel for diagnostic reports.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Report>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity.
    ///
    /// The minimum capacity is 1 (clamped).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Report>(capacity);
        Self { tx }
    }

    /// Publishes a report to all active receivers.
    ///
    /// If there are no receivers, the report is dropped.
    pub fn publish(&self, report: Report) {
        trace!(seq = report.seq, kind = ?report.kind, "report");
        let _ = self.tx.send(report);
    }

    /// Creates a new receiver that will observe subsequent reports.
    ///
    /// - Each call creates an **independent** receiver.
    /// - A receiver only gets reports **sent after** it subscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<Report> {
        self.tx.subscribe()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(1024)
    }
}
