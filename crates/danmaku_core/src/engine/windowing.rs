//! Item windowing around the playback position.
//!
//! Materializing a whole track onto a live surface is wasteful for long
//! media; only items near the current position matter. The engine keeps a
//! window of `behind`/`ahead` around the position and re-materializes when
//! playback nears an edge, throttled to avoid thrashing under rapid seeks.

use crate::models::{DanmakuConfig, DanmakuItem};

/// Window half-widths and re-window policy, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowingConfig {
    /// How far behind the position the window extends.
    pub behind_ms: i64,
    /// How far ahead of the position the window extends.
    pub ahead_ms: i64,
    /// Distance from a window edge that triggers an anticipatory shift.
    pub guard_ms: i64,
    /// Minimum wall time between re-window materializations.
    pub reprepare_throttle_ms: i64,
}

impl WindowingConfig {
    /// Create a config; negative values are clamped to zero.
    pub fn new(behind_ms: i64, ahead_ms: i64, guard_ms: i64, reprepare_throttle_ms: i64) -> Self {
        Self {
            behind_ms: behind_ms.max(0),
            ahead_ms: ahead_ms.max(0),
            guard_ms: guard_ms.max(0),
            reprepare_throttle_ms: reprepare_throttle_ms.max(0),
        }
    }
}

impl Default for WindowingConfig {
    fn default() -> Self {
        Self::new(60_000, 60_000, 5_000, 1_000)
    }
}

/// A concrete window over item time, inclusive at both bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl WindowRange {
    /// Window centered on `position_ms`, clamped so it never starts before 0.
    pub fn around(position_ms: i64, config: &WindowingConfig) -> Self {
        let start_ms = (position_ms - config.behind_ms).max(0);
        let end_ms = (position_ms + config.ahead_ms).max(start_ms);
        Self { start_ms, end_ms }
    }

    pub fn contains(&self, time_ms: i64) -> bool {
        time_ms >= self.start_ms && time_ms <= self.end_ms
    }
}

/// Items whose effective time (`time + offset`) falls inside the window.
pub fn apply_window(
    items: &[DanmakuItem],
    config: &DanmakuConfig,
    window: WindowRange,
) -> Vec<DanmakuItem> {
    items
        .iter()
        .filter(|item| window.contains(item.time_ms + config.offset_ms))
        .cloned()
        .collect()
}
