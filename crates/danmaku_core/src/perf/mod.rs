//! Lightweight engine performance sampling with a JSON debug report.
//!
//! Samples are aggregated in memory and flushed to the report file at most
//! every five seconds. A write failure disables the sampler for the rest of
//! the process; sampling must never interfere with playback.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::clock::TimeSource;

const MIN_FLUSH_INTERVAL_MS: i64 = 5_000;

/// Running count/total/max over recorded values.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    count: u64,
    total: i64,
    max: i64,
}

impl Stats {
    fn add(&mut self, value: i64) {
        self.count += 1;
        self.total += value;
        if value > self.max {
            self.max = value;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn avg(&self) -> i64 {
        if self.count == 0 {
            0
        } else {
            self.total / self.count as i64
        }
    }
}

/// Samples engine timing and writes a JSON debug report.
pub struct PerfSampler {
    time: TimeSource,
    report_path: Option<PathBuf>,
    disabled: bool,
    prepare: Stats,
    resync: Stats,
    window_width: Stats,
    throttle_count: u64,
    last_prepared_total: usize,
    last_prepared_window: usize,
    last_flush_ms: i64,
}

impl PerfSampler {
    /// Sampler that writes its report to `report_path`.
    pub fn new(time: TimeSource, report_path: impl Into<PathBuf>) -> Self {
        Self {
            time,
            report_path: Some(report_path.into()),
            disabled: false,
            prepare: Stats::default(),
            resync: Stats::default(),
            window_width: Stats::default(),
            throttle_count: 0,
            last_prepared_total: 0,
            last_prepared_window: 0,
            last_flush_ms: 0,
        }
    }

    /// No-op sampler; every record call returns immediately.
    pub fn disabled() -> Self {
        Self {
            time: Arc::new(|| 0),
            report_path: None,
            disabled: true,
            prepare: Stats::default(),
            resync: Stats::default(),
            window_width: Stats::default(),
            throttle_count: 0,
            last_prepared_total: 0,
            last_prepared_window: 0,
            last_flush_ms: 0,
        }
    }

    pub fn record_prepare(&mut self, duration_ms: i64, total_items: usize, windowed_items: usize) {
        if self.disabled {
            return;
        }
        self.prepare.add(duration_ms);
        self.last_prepared_total = total_items;
        self.last_prepared_window = windowed_items;
        self.flush_if_due();
    }

    pub fn record_resync(&mut self, drift_ms: i64) {
        if self.disabled {
            return;
        }
        self.resync.add(drift_ms);
        self.flush_if_due();
    }

    pub fn record_window(&mut self, start_ms: i64, end_ms: i64, windowed_items: usize) {
        if self.disabled {
            return;
        }
        self.window_width.add((end_ms - start_ms).max(0));
        self.last_prepared_window = windowed_items;
        self.flush_if_due();
    }

    pub fn record_throttle(&mut self, reason: &str) {
        if self.disabled {
            return;
        }
        self.throttle_count += 1;
        self.flush_if_due();
        debug!(reason, "throttled");
    }

    /// Write the report now, regardless of the flush interval.
    pub fn flush(&mut self) {
        if self.disabled {
            return;
        }
        let Some(path) = self.report_path.clone() else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!(error = %err, "unable to create perf report directory");
                self.disabled = true;
                return;
            }
        }
        match std::fs::write(&path, self.build_report()) {
            Ok(()) => self.last_flush_ms = (self.time)(),
            Err(err) => {
                warn!(error = %err, "failed to write perf report");
                self.disabled = true;
            }
        }
    }

    pub fn throttle_count(&self) -> u64 {
        self.throttle_count
    }

    pub fn prepare_stats(&self) -> Stats {
        self.prepare
    }

    pub fn resync_stats(&self) -> Stats {
        self.resync
    }

    pub fn window_stats(&self) -> Stats {
        self.window_width
    }

    fn flush_if_due(&mut self) {
        if (self.time)() - self.last_flush_ms >= MIN_FLUSH_INTERVAL_MS {
            self.flush();
        }
    }

    fn build_report(&self) -> String {
        let report = serde_json::json!({
            "prepare_count": self.prepare.count(),
            "prepare_avg_ms": self.prepare.avg(),
            "prepare_max_ms": self.prepare.max(),
            "resync_count": self.resync.count(),
            "resync_max_drift_ms": self.resync.max(),
            "window_count": self.window_width.count(),
            "window_avg_width_ms": self.window_width.avg(),
            "throttle_count": self.throttle_count,
            "last_prepared_total": self.last_prepared_total,
            "last_prepared_window": self.last_prepared_window,
            "timestamp_ms": (self.time)(),
        });
        serde_json::to_string_pretty(&report).unwrap_or_default()
    }
}
