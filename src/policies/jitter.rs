//! # Jitter for retry delays.
//!
//! [`JitterPolicy`] spreads retries of many failing deliveries so they do not
//! hit a shared dependency at the same instant.
//!
//! - [`JitterPolicy::None`] exact delay
//! - [`JitterPolicy::Full`] random in `[0, delay]`
//! - [`JitterPolicy::Equal`] `delay/2 + random[0, delay/2]`
//! - [`JitterPolicy::Decorrelated`] random in `[base, prev × 3]`, capped

use std::time::Duration;

use rand::Rng;

/// Randomization strategy for retry delays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Use the computed delay unchanged.
    #[default]
    None,
    /// Random delay in `[0, delay]`.
    Full,
    /// `delay/2 + random[0, delay/2]`.
    Equal,
    /// Random delay in `[base, prev × 3]`, capped at `max`.
    ///
    /// Needs context; see [`apply_decorrelated`](Self::apply_decorrelated).
    Decorrelated,
}

impl JitterPolicy {
    /// Applies jitter to `delay`.
    ///
    /// `Decorrelated` returns the input unchanged here.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None | JitterPolicy::Decorrelated => delay,
            JitterPolicy::Full => {
                let ms = millis(delay);
                if ms == 0 {
                    return Duration::ZERO;
                }
                Duration::from_millis(rand::rng().random_range(0..=ms))
            }
            JitterPolicy::Equal => {
                let half = millis(delay) / 2;
                let extra = if half == 0 {
                    0
                } else {
                    rand::rng().random_range(0..=half)
                };
                Duration::from_millis(half + extra)
            }
        }
    }

    /// Applies decorrelated jitter with its context.
    ///
    /// For other variants this is `apply(prev)`.
    pub fn apply_decorrelated(&self, base: Duration, prev: Duration, max: Duration) -> Duration {
        if !matches!(self, JitterPolicy::Decorrelated) {
            return self.apply(prev);
        }

        let base_ms = millis(base);
        let upper = millis(prev).saturating_mul(3).min(millis(max)).max(base_ms);
        if base_ms >= upper {
            return base;
        }
        Duration::from_millis(rand::rng().random_range(base_ms..=upper))
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}
