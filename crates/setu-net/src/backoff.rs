//! Exponential-backoff policy for push-channel reconnection.
//!
//! A dropped socket must not silently stop push updates, so the
//! listener keeps re-dialing with increasing delays until either the
//! connection is restored or its cancellation token fires. Jitter
//! spreads reconnect storms when many clients lose the same server.

use std::time::Duration;

use rand::Rng;

use setu_shared::constants::{RECONNECT_INITIAL_DELAY, RECONNECT_MAX_DELAY};

/// Reconnection timing parameters for the push listener.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Base delay used for the first re-dial after a drop.
    pub initial_delay: Duration,
    /// Ceiling the delay never exceeds, however many attempts fail.
    pub max_delay: Duration,
    /// Growth factor applied after each failed attempt.
    pub multiplier: f64,
    /// Fraction of the delay added as random jitter (0.0 to 1.0).
    pub jitter: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: RECONNECT_INITIAL_DELAY,
            max_delay: RECONNECT_MAX_DELAY,
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

/// Grow `current` by the configured multiplier, capped at
/// `max_delay`. Jitter is applied separately in [`with_jitter`] so
/// the growth sequence stays deterministic and testable.
pub fn next_delay(current: Duration, config: &ReconnectConfig) -> Duration {
    current.mul_f64(config.multiplier).min(config.max_delay)
}

/// Add up to `config.jitter` of random extra delay.
pub fn with_jitter(delay: Duration, config: &ReconnectConfig) -> Duration {
    if config.jitter <= 0.0 {
        return delay;
    }
    delay + delay.mul_f64(config.jitter * rand::thread_rng().gen::<f64>())
}
