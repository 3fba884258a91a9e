//! Reconnect backoff schedule for the host channel.
//!
//! When the connection to the playback host drops unintentionally, the
//! channel retries automatically.  To avoid hammering a host that is down
//! (or a Wi-Fi link that is flapping), successive retries wait longer and
//! longer, up to a configurable cap.
//!
//! # Full jitter
//!
//! The delay before attempt *n* is drawn uniformly from
//! `[0, min(cap, base * 2^n)]`.  Randomising the whole interval (rather
//! than adding a small jitter on top of the exponential value) spreads out
//! reconnect storms when many clients lose the same host at once.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{Duration, SystemTime};

/// Largest exponent applied to the base delay.
///
/// `base * 2^30` already exceeds any sane cap by many orders of magnitude,
/// and capping the shift keeps the arithmetic well away from overflow.
const MAX_EXPONENT: u32 = 30;

/// Parameters for the full-jitter exponential backoff schedule.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Ceiling for the very first retry (attempt 0).
    pub base: Duration,
    /// Upper bound that the exponential ceiling never exceeds.
    pub cap: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            cap: Duration::from_secs(30),
        }
    }
}

impl BackoffPolicy {
    /// Returns the deterministic ceiling for the given attempt number:
    /// `min(cap, base * 2^attempts)`.
    ///
    /// Attempt numbering starts at zero, so the first retry after a drop
    /// waits at most `base`.
    pub fn ceiling(&self, attempts: u32) -> Duration {
        let exponent = attempts.min(MAX_EXPONENT);
        let scaled = self
            .base
            .as_millis()
            .saturating_mul(1u128 << exponent)
            .min(self.cap.as_millis());
        Duration::from_millis(scaled as u64)
    }

    /// Samples the actual delay for the given attempt: a uniform value in
    /// `[0, ceiling(attempts)]`.
    pub fn delay(&self, attempts: u32) -> Duration {
        let ceiling_ms = self.ceiling(attempts).as_millis() as u64;
        if ceiling_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(sample_below(ceiling_ms))
    }
}

/// Draws a value in `[0, ceiling_ms]` without pulling in an RNG crate.
///
/// Hashing the current wall-clock time gives enough dispersion for retry
/// scheduling; cryptographic quality is not required here.
fn sample_below(ceiling_ms: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    SystemTime::now().hash(&mut hasher);
    std::thread::current().id().hash(&mut hasher);
    hasher.finish() % (ceiling_ms + 1)
}
