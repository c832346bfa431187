//! # Diagnostic reports emitted by the dispatch engine.
//!
//! The [`ReportKind`] enum classifies what happened inside the mediator across
//! three categories:
//! - **Publish events**: pipeline progress for one publish call
//! - **Delivery events**: outcome of one handler delivery (failure, retry, cancel)
//! - **Pool events**: worker pool back-pressure
//!
//! Reports are the out-of-band failure channel for fire-and-forget strategies:
//! a failure that cannot be returned to the publisher is still observable here.
//!
//! ## Ordering guarantees
//! Each report has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use eventvisor::{Report, ReportKind};
//!
//! let r = Report::new(ReportKind::RetryScheduled)
//!     .with_event_type("OrderPlaced")
//!     .with_subscription(3)
//!     .with_attempt(1)
//!     .with_delay(Duration::from_millis(250))
//!     .with_reason("db unavailable");
//!
//! assert_eq!(r.kind, ReportKind::RetryScheduled);
//! assert_eq!(r.delay_ms, Some(250));
//! assert_eq!(r.reason.as_deref(), Some("db unavailable"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for report ordering.
static REPORT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    // === Publish pipeline ===
    /// Publish entered the pipeline.
    ///
    /// Sets: `event_type`.
    PublishStarted,

    /// A before-hook returned `false`; nothing was dispatched.
    ///
    /// Sets: `event_type`, `reason` (interceptor name).
    PublishShortCircuited,

    /// Publish finished (dispatch handed off and after-hooks ran).
    ///
    /// Sets: `event_type`, `strategy`.
    PublishCompleted,

    /// No subscription exists for the dispatch key.
    ///
    /// Sets: `event_type`.
    NoSubscribers,

    // === Delivery ===
    /// A handler delivery failed (after its retry budget, if any).
    ///
    /// Sets: `event_type`, `subscription`, `reason`, `strategy`.
    DeliveryFailed,

    /// A handler panicked inside an isolation boundary.
    ///
    /// Sets: `event_type`, `subscription`, `reason`, `strategy`.
    HandlerPanicked,

    /// Another attempt was scheduled by a retrying executor.
    ///
    /// Sets: `event_type`, `subscription`, `attempt` (failed attempt), `delay_ms`, `reason`.
    RetryScheduled,

    /// A delivery was skipped because cancellation was requested.
    ///
    /// Sets: `event_type`, `subscription`, `strategy`.
    DeliveryCancelled,

    // === Pool ===
    /// The worker pool queue was full or closed; the delivery was dropped.
    ///
    /// Sets: `event_type`, `subscription`, `reason` ("full" / "closed").
    QueueOverflow,
}

/// Diagnostic report with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp
/// - other optional fields are set depending on the [`ReportKind`]
#[derive(Clone, Debug)]
pub struct Report {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Report classification.
    pub kind: ReportKind,

    /// Type name of the event being published or delivered.
    pub event_type: Option<&'static str>,
    /// Subscription id, if the report concerns one delivery.
    pub subscription: Option<u64>,
    /// Attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// Retry delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, interceptor names).
    pub reason: Option<Arc<str>>,
    /// Dispatch strategy label.
    pub strategy: Option<&'static str>,
}

impl Report {
    /// Creates a new report of the given kind with current timestamp and next sequence number.
    pub fn new(kind: ReportKind) -> Self {
        Self {
            seq: REPORT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            event_type: None,
            subscription: None,
            attempt: None,
            delay_ms: None,
            reason: None,
            strategy: None,
        }
    }

    /// Attaches the event type name.
    #[inline]
    pub fn with_event_type(mut self, name: &'static str) -> Self {
        self.event_type = Some(name);
        self
    }

    /// Attaches a subscription id.
    #[inline]
    pub fn with_subscription(mut self, id: u64) -> Self {
        self.subscription = Some(id);
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a retry delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the dispatch strategy label.
    #[inline]
    pub fn with_strategy(mut self, label: &'static str) -> Self {
        self.strategy = Some(label);
        self
    }

    /// Returns `true` for reports describing a lost or failed delivery.
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(
            self.kind,
            ReportKind::DeliveryFailed | ReportKind::HandlerPanicked | ReportKind::QueueOverflow
        )
    }
}
