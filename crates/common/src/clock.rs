//! Monotonic clock for sample timestamps.
//!
//! Every sample fed to the filter engine carries a timestamp in seconds
//! relative to a fixed epoch captured when the session starts. Recorded
//! event files store nanoseconds and are converted on load.

use std::time::Instant;

/// A session clock that provides monotonic timestamps relative to
/// the moment filtering started.
#[derive(Debug, Clone)]
pub struct EngineClock {
    /// The instant the session started.
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,
}

impl EngineClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Get seconds elapsed since session start.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at session start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Convert a nanosecond value to seconds.
    pub fn ns_to_secs(ns: u64) -> f64 {
        ns as f64 / 1_000_000_000.0
    }
}
