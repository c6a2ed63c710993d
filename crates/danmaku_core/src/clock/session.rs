//! Clock anchored from host-player session state snapshots.

use std::sync::Arc;

use super::{SoftClock, TimeSource};

/// Coarse player state carried by a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotState {
    Playing,
    /// Still advancing for alignment purposes.
    Buffering,
    Paused,
    Stopped,
}

/// Ground-truth observation published by the host player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSnapshot {
    /// Position at the time the snapshot was taken, in milliseconds.
    pub position_ms: i64,
    /// Playback speed (1.0 = normal).
    pub speed: f32,
    /// Wall time the snapshot was taken (0 = unknown).
    pub updated_at_ms: i64,
    /// Player state.
    pub state: SnapshotState,
}

/// Re-anchors a [`SoftClock`] from player snapshots.
///
/// Snapshots can be stale by the time they are observed; the position is
/// extrapolated forward from the snapshot's own timestamp before anchoring.
pub struct SessionClock {
    inner: Arc<SoftClock>,
    time: TimeSource,
}

impl SessionClock {
    pub fn new(inner: Arc<SoftClock>, time: TimeSource) -> Self {
        Self { inner, time }
    }

    /// The wrapped clock, to share with the engine.
    pub fn clock(&self) -> &Arc<SoftClock> {
        &self.inner
    }

    /// Anchor the clock from a snapshot.
    pub fn update_from_snapshot(&self, snapshot: &PlaybackSnapshot) {
        let anchor_realtime = (self.time)();
        let mut position = snapshot.position_ms;
        if snapshot.updated_at_ms > 0 {
            let delta = anchor_realtime - snapshot.updated_at_ms;
            position += (delta as f64 * snapshot.speed as f64) as i64;
        }
        let playing = matches!(
            snapshot.state,
            SnapshotState::Playing | SnapshotState::Buffering
        );
        self.inner.anchor(position, snapshot.speed, anchor_realtime, playing);
    }
}
