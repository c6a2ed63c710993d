//! Playback-position clocks.
//!
//! The engine never polls the player per frame; it extrapolates the current
//! position from the most recent `(position, speed, wall-time, playing)`
//! anchor. Wall time comes from an injected source so tests can drive it.

mod session;
mod soft;

pub use session::{PlaybackSnapshot, SessionClock, SnapshotState};
pub use soft::SoftClock;

use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::Lazy;

/// Monotonic wall-time provider, in milliseconds.
pub type TimeSource = Arc<dyn Fn() -> i64 + Send + Sync>;

static MONOTONIC_EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Default time source: milliseconds elapsed since first use in this process.
pub fn monotonic_time_source() -> TimeSource {
    Arc::new(|| MONOTONIC_EPOCH.elapsed().as_millis() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_source_does_not_go_backwards() {
        let time = monotonic_time_source();
        let first = time();
        let second = time();
        assert!(second >= first);
    }
}
