//! # Dispatch strategy selection.
//!
//! [`Strategy`] picks the concurrency model used to deliver one event to the
//! snapshot of its subscriptions. It is chosen once, in `MediatorConfig`.
//!
//! | Strategy             | Blocks publish | Order kept | Failure reaches publisher |
//! |----------------------|----------------|------------|---------------------------|
//! | `Sequential`         | yes            | yes        | yes (first, stops)        |
//! | `Chained`            | yes            | yes        | yes (first, stops)        |
//! | `Parallel`           | yes            | no         | yes (lowest index)        |
//! | `ThreadPerSubscriber`| no             | no         | no (reports only)         |
//! | `Pooled`             | no             | no         | no (reports only)         |

/// Concurrency model for delivering one event to many subscriptions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// One delivery at a time, in registration order.
    #[default]
    Sequential,
    /// Registration order, built as a chain of continuations awaited once.
    Chained,
    /// All deliveries concurrently on the tokio runtime; waits for all.
    Parallel,
    /// One OS thread per delivery; returns immediately.
    ThreadPerSubscriber,
    /// Deliveries queued onto a shared worker pool; returns immediately.
    Pooled,
}

impl Strategy {
    /// Returns a short stable label for logs and reports.
    pub fn as_label(&self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::Chained => "chained",
            Strategy::Parallel => "parallel",
            Strategy::ThreadPerSubscriber => "thread",
            Strategy::Pooled => "pooled",
        }
    }

    /// `true` if `publish` waits for deliveries and returns their failure.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            Strategy::Sequential | Strategy::Chained | Strategy::Parallel
        )
    }
}
