//! In-memory soft clock that extrapolates playback time from a recent anchor.

use parking_lot::Mutex;

use super::TimeSource;

#[derive(Debug, Clone, Copy)]
struct Anchor {
    position_ms: i64,
    realtime_ms: i64,
    speed: f32,
    playing: bool,
}

/// Extrapolating playback clock.
///
/// State is five scalars updated atomically together; a single mutex keeps
/// reads consistent when player-event callbacks anchor from a different
/// thread than the tick loop.
pub struct SoftClock {
    time: TimeSource,
    state: Mutex<Anchor>,
}

impl SoftClock {
    pub fn new(time: TimeSource) -> Self {
        let now = time();
        Self {
            time,
            state: Mutex::new(Anchor {
                position_ms: 0,
                realtime_ms: now,
                speed: 1.0,
                playing: false,
            }),
        }
    }

    /// Current estimated playback position in milliseconds.
    pub fn now_ms(&self) -> i64 {
        let state = self.state.lock();
        if !state.playing {
            return state.position_ms;
        }
        let delta = (self.time)() - state.realtime_ms;
        state.position_ms + (delta as f64 * state.speed as f64) as i64
    }

    /// Last known playback speed (1.0 = normal).
    pub fn speed(&self) -> f32 {
        self.state.lock().speed
    }

    /// Whether the clock is advancing.
    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    /// Anchor at `position_ms`, observed at wall time `anchor_realtime_ms`.
    pub fn anchor(&self, position_ms: i64, speed: f32, anchor_realtime_ms: i64, playing: bool) {
        *self.state.lock() = Anchor {
            position_ms,
            realtime_ms: anchor_realtime_ms,
            speed,
            playing,
        };
    }

    /// Freeze at the provided position.
    pub fn pause(&self, position_ms: i64, anchor_realtime_ms: i64) {
        self.anchor(position_ms, 0.0, anchor_realtime_ms, false);
    }

    /// Re-anchor at a new position, keeping the current speed and play state.
    pub fn seek(&self, position_ms: i64, anchor_realtime_ms: i64) {
        let mut state = self.state.lock();
        state.position_ms = position_ms;
        state.realtime_ms = anchor_realtime_ms;
    }
}
