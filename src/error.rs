//! Error types used by the mediator and by event handlers.
//!
//! This module defines two main error enums:
//!
//! - [`MediatorError`] - errors raised by the mediator itself (registration, publish policy).
//! - [`HandlerError`] - errors raised by individual handler deliveries.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging
//! and additional utilities such as [`HandlerError::is_retryable`].

use thiserror::Error;

/// # Errors produced by the mediator.
///
/// Registration-time validation errors are returned synchronously from the
/// call that violates the contract. Handler failures surface through
/// [`MediatorError::Handler`] only under blocking dispatch strategies.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum MediatorError {
    /// A registration or construction call received an argument it cannot accept.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the argument.
        reason: String,
    },

    /// Publish found no subscription for the (possibly transformed) event type
    /// and `fail_on_no_subscribers` is enabled.
    #[error("no subscribers registered for '{event_type}'")]
    NoSubscribers {
        /// Type name used as the dispatch key.
        event_type: &'static str,
    },

    /// A handler failed and the failure was surfaced by a blocking strategy.
    ///
    /// The inner error is the handler's own failure, unchanged.
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl MediatorError {
    /// Shorthand for [`MediatorError::InvalidArgument`].
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        MediatorError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use eventvisor::MediatorError;
    ///
    /// let err = MediatorError::NoSubscribers { event_type: "OrderPlaced" };
    /// assert_eq!(err.as_label(), "mediator_no_subscribers");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            MediatorError::InvalidArgument { .. } => "mediator_invalid_argument",
            MediatorError::NoSubscribers { .. } => "mediator_no_subscribers",
            MediatorError::Handler(_) => "mediator_handler_failure",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            MediatorError::InvalidArgument { reason } => format!("invalid argument: {reason}"),
            MediatorError::NoSubscribers { event_type } => {
                format!("no subscribers for {event_type}")
            }
            MediatorError::Handler(e) => e.as_message(),
        }
    }

    /// Returns the underlying handler failure, if this is one.
    pub fn as_handler(&self) -> Option<&HandlerError> {
        match self {
            MediatorError::Handler(e) => Some(e),
            _ => None,
        }
    }
}

/// # Errors produced by a single handler delivery.
///
/// Some errors are retryable (`Fail`, `Panicked`), others are considered fatal.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Delivery failed but may succeed if retried.
    #[error("handler failed: {reason}")]
    Fail {
        /// The underlying error message.
        reason: String,
    },

    /// Non-recoverable failure (should not be retried).
    #[error("fatal handler error (no retry): {reason}")]
    Fatal {
        /// The underlying error message.
        reason: String,
    },

    /// Handler panicked; the panic was caught at an isolation boundary.
    #[error("handler panicked: {reason}")]
    Panicked {
        /// Panic payload rendered as text.
        reason: String,
    },

    /// Type-erased event did not match the handler's event type.
    #[error("event type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Handler's event type.
        expected: &'static str,
        /// Type carried by the envelope.
        found: &'static str,
    },
}

impl HandlerError {
    /// Builds a retryable failure from anything printable.
    ///
    /// # Example
    /// ```
    /// use eventvisor::HandlerError;
    ///
    /// let err = HandlerError::fail("db unavailable");
    /// assert!(err.is_retryable());
    /// ```
    pub fn fail(reason: impl std::fmt::Display) -> Self {
        HandlerError::Fail {
            reason: reason.to_string(),
        }
    }

    /// Builds a fatal failure from anything printable.
    pub fn fatal(reason: impl std::fmt::Display) -> Self {
        HandlerError::Fatal {
            reason: reason.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Fail { .. } => "handler_failed",
            HandlerError::Fatal { .. } => "handler_fatal",
            HandlerError::Panicked { .. } => "handler_panicked",
            HandlerError::TypeMismatch { .. } => "handler_type_mismatch",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Fail { reason } => format!("error: {reason}"),
            HandlerError::Fatal { reason } => format!("fatal: {reason}"),
            HandlerError::Panicked { reason } => format!("panic: {reason}"),
            HandlerError::TypeMismatch { expected, found } => {
                format!("mismatch: expected={expected} found={found}")
            }
        }
    }

    /// Indicates whether another attempt may succeed.
    ///
    /// Returns `true` for [`HandlerError::Fail`] and [`HandlerError::Panicked`],
    /// `false` otherwise.
    ///
    /// # Example
    /// ```
    /// use eventvisor::HandlerError;
    ///
    /// assert!(HandlerError::fail("boom").is_retryable());
    /// assert!(!HandlerError::fatal("nope").is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, HandlerError::Fail { .. } | HandlerError::Panicked { .. })
    }

    /// Renders a caught panic payload.
    pub(crate) fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let reason = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        HandlerError::Panicked { reason }
    }
}
