//! # Delay policy between handler delivery attempts.
//!
//! [`BackoffPolicy`] controls how long a retrying executor waits before the
//! next attempt of a failed delivery. It is parameterized by:
//! - [`BackoffPolicy::first`] the delay before the first retry;
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::max`] the maximum delay cap;
//! - [`BackoffPolicy::jitter`] randomization applied to the capped delay.
//!
//! The delay for retry `n` (0-based) is `first × factor^n`, clamped to `max`,
//! then jitter is applied. The base is derived from `n` only, so jitter output
//! never feeds back into later delays.
//!
//! A plain fixed delay is [`BackoffPolicy::constant`].
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use eventvisor::{BackoffPolicy, JitterPolicy};
//!
//! let fixed = BackoffPolicy::constant(Duration::from_millis(50));
//! assert_eq!(fixed.next(0), Duration::from_millis(50));
//! assert_eq!(fixed.next(7), Duration::from_millis(50));
//!
//! let growing = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(1),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//! assert_eq!(growing.next(1), Duration::from_millis(200));
//! assert_eq!(growing.next(10), Duration::from_secs(1));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Retry delay policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub first: Duration,
    /// Maximum delay cap.
    pub max: Duration,
    /// Multiplicative growth factor (`1.0` = constant).
    pub factor: f64,
    /// Randomization applied on top of the capped delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Constant 100ms delay, no jitter.
    fn default() -> Self {
        Self::constant(Duration::from_millis(100))
    }
}

impl BackoffPolicy {
    /// Fixed delay between attempts (`factor = 1.0`, no jitter).
    pub fn constant(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Computes the delay before retry `retry` (0-indexed).
    ///
    /// # Notes
    /// - `factor < 1.0` shrinks delays (not typical).
    /// - Non-finite or negative intermediate values clamp to `max`.
    pub fn next(&self, retry: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = retry.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };

        match self.jitter {
            JitterPolicy::Decorrelated => {
                self.jitter
                    .apply_decorrelated(self.first.min(self.max), base, self.max)
            }
            _ => self.jitter.apply(base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exponential(jitter: JitterPolicy) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter,
        }
    }

    #[test]
    fn constant_never_changes() {
        let policy = BackoffPolicy::constant(Duration::from_millis(5));
        for retry in 0..20 {
            assert_eq!(policy.next(retry), Duration::from_millis(5));
        }
    }

    #[test]
    fn zero_delay_is_allowed() {
        let policy = BackoffPolicy::constant(Duration::ZERO);
        assert_eq!(policy.next(3), Duration::ZERO);
    }

    #[test]
    fn exponential_growth_without_jitter() {
        let policy = exponential(JitterPolicy::None);
        assert_eq!(policy.next(0), Duration::from_millis(100));
        assert_eq!(policy.next(1), Duration::from_millis(200));
        assert_eq!(policy.next(2), Duration::from_millis(400));
        assert_eq!(policy.next(3), Duration::from_millis(800));
    }

    #[test]
    fn first_above_max_is_capped() {
        let policy = BackoffPolicy {
            first: Duration::from_secs(10),
            max: Duration::from_secs(5),
            factor: 2.0,
            jitter: JitterPolicy::None,
        };
        assert_eq!(policy.next(0), Duration::from_secs(5));
    }

    #[test]
    fn overflow_clamps_to_max() {
        let policy = exponential(JitterPolicy::None);
        assert_eq!(policy.next(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn equal_jitter_stays_within_half_and_base() {
        let policy = exponential(JitterPolicy::Equal);
        for retry in 0..12 {
            let base_ms = (100.0 * 2.0f64.powi(retry as i32)).min(30_000.0);
            let delay = policy.next(retry);
            assert!(delay >= Duration::from_millis((base_ms / 2.0) as u64));
            assert!(delay <= Duration::from_millis(base_ms as u64));
        }
    }

    #[test]
    fn full_jitter_never_exceeds_base() {
        let policy = exponential(JitterPolicy::Full);
        for retry in 0..12 {
            let base_ms = (100.0 * 2.0f64.powi(retry as i32)).min(30_000.0);
            assert!(policy.next(retry) <= Duration::from_millis(base_ms as u64));
        }
    }

    #[test]
    fn decorrelated_jitter_respects_floor_and_cap() {
        let policy = exponential(JitterPolicy::Decorrelated);
        for _ in 0..100 {
            let delay = policy.next(8);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_secs(30));
        }
    }
}
