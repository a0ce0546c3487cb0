//! Per-source outbound request pacing.

use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Grants at most one outbound slot per `interval` for a single upstream source.
///
/// Each source adapter owns one limiter for the lifetime of the process. The
/// last grant instant sits behind an async mutex that stays held while a
/// caller sleeps, so reservations from any number of tasks are granted one at
/// a time, each at least `interval` after the previous one. Pacing is
/// in-process only and does not coordinate between separate gateway instances.
pub struct SourceRateLimiter {
    source: String,
    interval: Duration,
    last_grant: Mutex<Option<Instant>>,
}

impl SourceRateLimiter {
    /// Create a limiter allowing one call per `interval`.
    ///
    /// A zero interval disables pacing entirely.
    pub fn new(source: impl Into<String>, interval: Duration) -> Self {
        Self {
            source: source.into(),
            interval,
            last_grant: Mutex::new(None),
        }
    }

    /// Minimum spacing between two granted slots
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the next slot for this source is available and claim it.
    ///
    /// Returns the instant the slot was granted.
    pub async fn reserve_slot(&self) -> Instant {
        if self.interval.is_zero() {
            return Instant::now();
        }

        let mut last_grant = self.last_grant.lock().await;

        if let Some(previous) = *last_grant {
            let ready_at = previous + self.interval;
            if ready_at > Instant::now() {
                debug!(
                    source = %self.source,
                    interval_ms = self.interval.as_millis() as u64,
                    "waiting for rate slot"
                );
                sleep_until(ready_at).await;
            }
        }

        let granted = Instant::now();
        *last_grant = Some(granted);
        debug!(source = %self.source, "rate slot granted");
        granted
    }
}

impl fmt::Debug for SourceRateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRateLimiter")
            .field("source", &self.source)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
