//! Overlay engine: coordinates rendering, playback alignment, track
//! selection and state persistence.
//!
//! The engine is driven cooperatively from the host's event loop: playback
//! callbacks re-anchor the clock, a periodic `tick` keeps the surface within
//! the resync threshold, and selection/config calls mutate the cached track
//! state. Every surface failure degrades to "not prepared" and is retried on
//! a later tick; no public operation propagates an error.

pub mod cache;
mod error;
pub mod filter;
pub mod windowing;

pub use error::{LoadError, LoadErrorReason};
pub use windowing::{WindowRange, WindowingConfig};

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::clock::{monotonic_time_source, SoftClock, TimeSource};
use crate::models::{DanmakuConfig, DanmakuItem, DanmakuTrack, MediaKey, SourceKind, TrackCandidate};
use crate::perf::PerfSampler;
use crate::prefs::PreferencesStore;
use crate::renderer::{DanmakuRenderer, SurfaceError};
use crate::source::{BiliXmlParser, LocalTrackDiscovery, ParseError, TrackDiscovery, TrackParser};
use cache::{CachedTrack, ItemsState, TrackCache};

/// Drift at which the surface is re-seeked to the clock.
const RESYNC_THRESHOLD_MS: i64 = 200;

/// Point-in-time view of engine playback state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineStatus {
    pub visible: bool,
    pub playing: bool,
    pub position_ms: i64,
    pub speed: f32,
}

struct ActiveSelection {
    track: DanmakuTrack,
    items: Arc<Vec<DanmakuItem>>,
    config: DanmakuConfig,
}

struct WindowState {
    start_ms: i64,
    end_ms: i64,
    shift_pending: bool,
    last_prepare_realtime_ms: i64,
}

/// The orchestrator.
pub struct DanmakuEngine {
    renderer: Option<Box<dyn DanmakuRenderer>>,
    clock: Arc<SoftClock>,
    prefs: Box<dyn PreferencesStore>,
    parser: Box<dyn TrackParser>,
    discovery: Box<dyn TrackDiscovery>,
    realtime_now: TimeSource,
    windowing: WindowingConfig,
    sampler: PerfSampler,
    cache: TrackCache,
    active: Option<ActiveSelection>,
    visible: bool,
    prepared: bool,
    window: WindowState,
    last_applied_position_ms: i64,
    last_error: Option<LoadError>,
}

/// Assembles an engine with optional collaborators defaulted.
pub struct EngineBuilder {
    renderer: Box<dyn DanmakuRenderer>,
    clock: Arc<SoftClock>,
    prefs: Box<dyn PreferencesStore>,
    parser: Box<dyn TrackParser>,
    discovery: Box<dyn TrackDiscovery>,
    realtime_now: TimeSource,
    windowing: WindowingConfig,
    sampler: PerfSampler,
}

impl EngineBuilder {
    pub fn parser(mut self, parser: Box<dyn TrackParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn discovery(mut self, discovery: Box<dyn TrackDiscovery>) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn time_source(mut self, realtime_now: TimeSource) -> Self {
        self.realtime_now = realtime_now;
        self
    }

    pub fn windowing(mut self, windowing: WindowingConfig) -> Self {
        self.windowing = windowing;
        self
    }

    pub fn sampler(mut self, sampler: PerfSampler) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn build(self) -> DanmakuEngine {
        let now = (self.realtime_now)();
        DanmakuEngine {
            renderer: Some(self.renderer),
            clock: self.clock,
            prefs: self.prefs,
            parser: self.parser,
            discovery: self.discovery,
            realtime_now: self.realtime_now,
            windowing: self.windowing,
            sampler: self.sampler,
            cache: TrackCache::new(),
            active: None,
            visible: false,
            prepared: false,
            window: WindowState {
                start_ms: 0,
                end_ms: i64::MAX,
                shift_pending: false,
                last_prepare_realtime_ms: now,
            },
            last_applied_position_ms: 0,
            last_error: None,
        }
    }
}

impl DanmakuEngine {
    /// Start building an engine around the required collaborators.
    pub fn builder(
        renderer: Box<dyn DanmakuRenderer>,
        clock: Arc<SoftClock>,
        prefs: Box<dyn PreferencesStore>,
    ) -> EngineBuilder {
        EngineBuilder {
            renderer,
            clock,
            prefs,
            parser: Box::new(BiliXmlParser::new()),
            discovery: Box::new(LocalTrackDiscovery::new()),
            realtime_now: monotonic_time_source(),
            windowing: WindowingConfig::default(),
            sampler: PerfSampler::disabled(),
        }
    }

    /// Register an already-parsed track and immediately select it.
    pub fn bind_track(
        &mut self,
        track: DanmakuTrack,
        items: Vec<DanmakuItem>,
        config: DanmakuConfig,
    ) {
        let media = track.media.clone();
        let track_id = track.id.clone();
        let entry = CachedTrack {
            track,
            items: ItemsState::Materialized(Arc::new(items)),
            config,
            score: 100,
            reason: "prebound".to_string(),
        };
        let protected = self.active_media();
        self.cache.insert(entry, protected.as_ref());
        debug!(track = %track_id, "bound prepared track");
        self.select_track(&media, &track_id);
    }

    /// Swap in a recreated render surface (e.g. after a host view rebuild).
    pub fn attach_renderer(&mut self, renderer: Box<dyn DanmakuRenderer>) {
        self.renderer = Some(renderer);
        self.prepared = false;
        debug!("renderer reattached; prepared state reset");
        if self.active.as_ref().is_some_and(|a| !a.items.is_empty()) {
            self.prepare_renderer();
            self.apply_playback_state(true);
        }
    }

    /// Release and drop the current render surface.
    pub fn detach_renderer(&mut self) {
        if self.renderer.is_some() {
            self.safe_surface_call("release", |surface| surface.release());
            self.renderer = None;
            self.prepared = false;
        }
        self.sampler.flush();
    }

    /// Keep the surface aligned; call periodically from the host's frame or
    /// playback loop.
    pub fn tick(&mut self) {
        if self.renderer.is_none() {
            return;
        }
        if !self.active.as_ref().is_some_and(|a| !a.items.is_empty()) {
            return;
        }
        let effective = self.effective_position();
        self.refresh_window(effective);
        if !self.prepared || !self.surface_prepared() {
            self.prepare_renderer();
        }
        if !self.prepared || !self.surface_prepared() {
            return;
        }
        let effective = self.effective_position();
        let drift = (effective - self.last_applied_position_ms).abs();
        if drift >= RESYNC_THRESHOLD_MS {
            self.safe_surface_call("seek_to", |s| s.seek_to(effective));
            self.last_applied_position_ms = effective;
            self.sampler.record_resync(drift);
        }
        let speed = self.clock.speed();
        self.safe_surface_call("set_speed", |s| s.set_speed(speed));
        if self.clock.is_playing() {
            self.safe_surface_call("play", |s| s.play());
        } else {
            self.safe_surface_call("pause", |s| s.pause());
        }
    }

    /// Anchor the clock from player ground truth and apply immediately.
    pub fn update_playback_state(&mut self, position_ms: i64, speed: f32, playing: bool) {
        self.clock
            .anchor(position_ms, speed, (self.realtime_now)(), playing);
        self.apply_playback_state(true);
    }

    /// Freeze at the current extrapolated position.
    pub fn pause(&mut self) {
        self.clock.pause(self.clock.now_ms(), (self.realtime_now)());
        self.apply_playback_state(false);
    }

    /// Candidates for `media`, running discovery if this identity is new.
    pub fn track_candidates(&mut self, media: &MediaKey) -> Vec<TrackCandidate> {
        self.ensure_candidates(media);
        self.cache.candidates_for(media)
    }

    /// Select a track by id, lazily parsing it if needed.
    ///
    /// `track_id` may also be a bare file path for manual picks that never
    /// went through discovery. On failure the previous selection stays
    /// active and the error is available from [`DanmakuEngine::last_error`].
    pub fn select_track(&mut self, media: &MediaKey, track_id: &str) {
        self.select_track_internal(media, track_id, true);
    }

    /// Show or hide the overlay; independent of prepared state.
    pub fn set_visibility(&mut self, visible: bool) {
        self.visible = visible;
        self.safe_surface_call("set_visible", |s| s.set_visible(visible));
    }

    /// Replace the active config, persist it, and re-prepare.
    pub fn update_config(&mut self, config: DanmakuConfig) {
        let media = if let Some(active) = self.active.as_mut() {
            active.config = config.clone();
            Some(active.track.media.clone())
        } else {
            None
        };
        if let Some(media) = media {
            self.prefs.save_config(&media, &config);
        }
        self.prepared = false;
        debug!("config updated; will re-prepare renderer");
        self.prepare_renderer();
        self.apply_playback_state(true);
    }

    /// Re-anchor at `position_ms`; falls back to a full re-window when the
    /// effective position leaves the materialized window.
    pub fn seek(&mut self, position_ms: i64) {
        self.clock.seek(position_ms, (self.realtime_now)());
        let offset = self.active.as_ref().map_or(0, |a| a.config.offset_ms);
        let effective = position_ms + offset;
        if !self.is_within_window(effective) {
            self.window.shift_pending = true;
            self.prepared = false;
            self.apply_playback_state(true);
            return;
        }
        if self.surface_prepared() {
            self.safe_surface_call("seek_to", |s| s.seek_to(effective));
            self.last_applied_position_ms = effective;
        }
    }

    /// Change playback speed, re-anchoring so the position does not jump.
    pub fn update_speed(&mut self, speed: f32) {
        self.clock.anchor(
            self.clock.now_ms(),
            speed,
            (self.realtime_now)(),
            self.clock.is_playing(),
        );
        if self.surface_prepared() {
            self.safe_surface_call("set_speed", |s| s.set_speed(speed));
        }
    }

    /// Drop a cache entry; clears the selection if it was active.
    pub fn remove_track(&mut self, media: &MediaKey, track_id: &str) {
        self.cache.remove(media, track_id);
        let was_active = self
            .active
            .as_ref()
            .is_some_and(|a| a.track.media == *media && a.track.id == track_id);
        if was_active {
            self.active = None;
            self.prepared = false;
            debug!(track = %track_id, "active track unloaded");
        }
    }

    /// Current playback/visibility snapshot.
    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            visible: self.visible,
            playing: self.clock.is_playing(),
            position_ms: self.clock.now_ms(),
            speed: self.clock.speed(),
        }
    }

    /// The active track, if any.
    pub fn active_track(&self) -> Option<&DanmakuTrack> {
        self.active.as_ref().map(|a| &a.track)
    }

    /// Failure of the most recent load attempt, if any.
    pub fn last_error(&self) -> Option<&LoadError> {
        self.last_error.as_ref()
    }

    fn select_track_internal(&mut self, media: &MediaKey, track_id: &str, run_discovery: bool) {
        if track_id.is_empty() {
            warn!("select_track ignored: track id is empty");
            return;
        }
        self.last_error = None;
        if run_discovery {
            self.ensure_candidates(media);
        }
        let mut entry = match self.cache.get(media, track_id) {
            Some(entry) => entry.clone(),
            None => match self.load_from_path(media, track_id) {
                Some(entry) => entry,
                None => {
                    warn!(media = %media.serialize(), track = %track_id, "no matching track");
                    return;
                }
            },
        };
        if !entry.items.is_materialized() {
            match self.parse_track_from_disk(&entry.track, entry.score, entry.reason.clone()) {
                Some(parsed) => {
                    entry = parsed;
                    let protected = self.active_media();
                    self.cache.insert(entry.clone(), protected.as_ref());
                }
                None => {
                    // A vanished backing file keeps its `missing` reason;
                    // everything else collapses to a promotion failure.
                    if self.last_error.as_ref().map(|e| e.reason)
                        != Some(LoadErrorReason::Missing)
                    {
                        self.last_error = Some(LoadError::new(
                            entry.track.file_path.clone(),
                            LoadErrorReason::ParseFailed,
                        ));
                    }
                    warn!(track = %track_id, "unable to parse track");
                    return;
                }
            }
        }
        let ItemsState::Materialized(items) = entry.items.clone() else {
            return;
        };
        let config = self.merge_config(&entry.track, &entry.config);
        debug!(track = %track_id, items = items.len(), "selected track");
        self.active = Some(ActiveSelection {
            track: entry.track.clone(),
            items,
            config: config.clone(),
        });
        self.prepared = false;
        self.window.shift_pending = false;
        self.window.start_ms = 0;
        self.window.end_ms = i64::MAX;
        self.prepare_renderer();
        self.apply_playback_state(true);
        self.prefs.save_last_track(media, &entry.track);
        self.prefs.save_config(media, &config);
    }

    /// Populate the cache for a new media identity and reconcile selection
    /// with the persisted last track.
    fn ensure_candidates(&mut self, media: &MediaKey) {
        if self.cache.has_media(media) {
            if let Some(last_id) = self.prefs.last_track_id(media) {
                if self.cache.contains(media, &last_id)
                    && self.active_id().as_deref() != Some(last_id.as_str())
                {
                    self.select_track_internal(media, &last_id, false);
                }
            }
            return;
        }

        let discovered = self.discovery.discover(media);
        let protected = self.active_media();
        for candidate in &discovered {
            let entry = CachedTrack {
                track: candidate.track.clone(),
                items: ItemsState::MetadataOnly,
                config: candidate.track.config.clone(),
                score: candidate.score,
                reason: candidate.reason.clone(),
            };
            self.cache.insert(entry, protected.as_ref());
        }

        if let Some(last_id) = self.prefs.last_track_id(media) {
            if self.cache.contains(media, &last_id) {
                self.select_track_internal(media, &last_id, false);
                return;
            }
        }
        if let Some(best) = discovered.first() {
            let best_id = best.track.id.clone();
            if self.active_id().as_deref() != Some(best_id.as_str()) {
                self.select_track_internal(media, &best_id, false);
            }
        }
    }

    /// Manual pick that never went through discovery: treat the id as a
    /// storage locator and parse it directly.
    fn load_from_path(&mut self, media: &MediaKey, track_id: &str) -> Option<CachedTrack> {
        let path = Path::new(track_id);
        if !path.exists() {
            warn!(track = %track_id, "track file missing");
            self.last_error = Some(LoadError::new(path, LoadErrorReason::Missing));
            return None;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| track_id.to_string());
        let track = DanmakuTrack::new(track_id, name, SourceKind::Local, path, media.clone());
        let entry = self.parse_track_from_disk(&track, 80, "file".to_string())?;
        let protected = self.active_media();
        self.cache.insert(entry.clone(), protected.as_ref());
        Some(entry)
    }

    fn parse_track_from_disk(
        &mut self,
        track: &DanmakuTrack,
        score: i32,
        reason: String,
    ) -> Option<CachedTrack> {
        let path = &track.file_path;
        if !path.is_file() {
            self.last_error = Some(LoadError::new(path.clone(), LoadErrorReason::Missing));
            warn!(path = %path.display(), "track file missing or unreadable");
            return None;
        }
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.last_error = Some(LoadError::new(path.clone(), LoadErrorReason::Io));
                warn!(path = %path.display(), error = %err, "failed to read danmaku file");
                return None;
            }
        };
        match self.parser.parse(&bytes) {
            Ok(items) => {
                self.last_error = None;
                Some(CachedTrack {
                    track: track.clone(),
                    items: ItemsState::Materialized(Arc::new(items)),
                    config: track.config.clone(),
                    score,
                    reason,
                })
            }
            Err(err) => {
                let reason_kind = match err {
                    ParseError::Malformed(_) => LoadErrorReason::Malformed,
                    ParseError::Io(_) => LoadErrorReason::Io,
                };
                self.last_error = Some(LoadError::new(path.clone(), reason_kind));
                warn!(path = %path.display(), error = %err, "failed to parse danmaku file");
                None
            }
        }
    }

    /// Precedence: persisted per-media config, then the user-level default,
    /// then the candidate's own suggestion (which already falls back to the
    /// track's intrinsic defaults).
    fn merge_config(&mut self, track: &DanmakuTrack, candidate: &DanmakuConfig) -> DanmakuConfig {
        if let Some(saved) = self.prefs.config(&track.media) {
            return saved;
        }
        if let Some(default) = self.prefs.default_config() {
            return default;
        }
        candidate.clone()
    }

    fn apply_playback_state(&mut self, force_seek: bool) {
        if self.renderer.is_none() || self.active.is_none() {
            return;
        }
        let effective = self.effective_position();
        self.refresh_window(effective);
        if !self.prepared {
            self.prepare_renderer();
        }
        let visible = self.visible;
        self.safe_surface_call("set_visible", |s| s.set_visible(visible));
        if !self.surface_prepared() {
            return;
        }
        let effective = self.effective_position();
        let drift = (effective - self.last_applied_position_ms).abs();
        if force_seek || drift >= RESYNC_THRESHOLD_MS {
            self.safe_surface_call("seek_to", |s| s.seek_to(effective));
            self.last_applied_position_ms = effective;
            if !force_seek {
                self.sampler.record_resync(drift);
            }
        }
        let speed = self.clock.speed();
        self.safe_surface_call("set_speed", |s| s.set_speed(speed));
        if self.clock.is_playing() {
            self.safe_surface_call("play", |s| s.play());
        } else {
            self.safe_surface_call("pause", |s| s.pause());
        }
    }

    /// Decide whether the materialized window still covers the position;
    /// schedule a re-prepare (or defer it under throttle) when it does not.
    fn refresh_window(&mut self, position_ms: i64) {
        if !self.active.as_ref().is_some_and(|a| !a.items.is_empty()) {
            return;
        }
        let before = position_ms < self.window.start_ms;
        let after = position_ms > self.window.end_ms;
        let near_start =
            self.window.start_ms > 0 && position_ms < self.window.start_ms + self.windowing.guard_ms;
        let near_end = self.window.end_ms < i64::MAX
            && position_ms > self.window.end_ms - self.windowing.guard_ms;
        let needs_shift = before || after || near_start || near_end || self.window.shift_pending;
        if !needs_shift {
            return;
        }
        let now = (self.realtime_now)();
        if now - self.window.last_prepare_realtime_ms < self.windowing.reprepare_throttle_ms {
            self.window.shift_pending = true;
            self.sampler.record_throttle("window");
            debug!(position_ms, "window shift throttled");
            return;
        }
        self.prepared = false;
        self.window.shift_pending = false;
        debug!(
            position_ms,
            window_start = self.window.start_ms,
            window_end = self.window.end_ms,
            "window shift scheduled"
        );
    }

    /// Filter and window the active items, then hand them to the surface.
    fn prepare_renderer(&mut self) {
        if self.renderer.is_none() {
            debug!("prepare skipped: no render surface attached");
            return;
        }
        let Some(active) = self.active.as_ref() else {
            return;
        };
        if active.items.is_empty() {
            debug!("prepare skipped: active track has no items");
            return;
        }
        let items = Arc::clone(&active.items);
        let config = active.config.clone();

        let window = WindowRange::around(self.effective_position(), &self.windowing);
        let filtered = filter::apply_filters(&items, &config);
        let windowed = windowing::apply_window(&filtered, &config, window);

        let start_realtime = (self.realtime_now)();
        {
            let Some(surface) = self.renderer.as_deref_mut() else {
                return;
            };
            if let Err(err) = surface.prepare(&windowed, &config) {
                self.prepared = false;
                warn!(error = %err, "render surface prepare failed");
                return;
            }
            self.prepared = surface.is_prepared();
        }
        let duration = ((self.realtime_now)() - start_realtime).max(0);
        self.sampler
            .record_prepare(duration, filtered.len(), windowed.len());
        self.sampler
            .record_window(window.start_ms, window.end_ms, windowed.len());

        self.window.start_ms = window.start_ms;
        self.window.end_ms = window.end_ms;
        self.window.shift_pending = false;
        self.window.last_prepare_realtime_ms = (self.realtime_now)();
        self.last_applied_position_ms = self.effective_position();
        if self.prepared && self.visible {
            let position = self.last_applied_position_ms;
            self.safe_surface_call("set_visible", |s| s.set_visible(true));
            self.safe_surface_call("seek_to", |s| s.seek_to(position));
        }
    }

    fn effective_position(&self) -> i64 {
        let offset = self.active.as_ref().map_or(0, |a| a.config.offset_ms);
        self.clock.now_ms() + offset
    }

    fn is_within_window(&self, effective_position_ms: i64) -> bool {
        effective_position_ms >= self.window.start_ms && effective_position_ms <= self.window.end_ms
    }

    fn surface_prepared(&self) -> bool {
        self.renderer.as_ref().is_some_and(|r| r.is_prepared())
    }

    fn active_id(&self) -> Option<String> {
        self.active.as_ref().map(|a| a.track.id.clone())
    }

    fn active_media(&self) -> Option<MediaKey> {
        self.active.as_ref().map(|a| a.track.media.clone())
    }

    fn safe_surface_call(
        &mut self,
        action: &str,
        call: impl FnOnce(&mut dyn DanmakuRenderer) -> Result<(), SurfaceError>,
    ) {
        let Some(surface) = self.renderer.as_deref_mut() else {
            return;
        };
        if let Err(err) = call(surface) {
            self.prepared = false;
            warn!(action, error = %err, "render surface call failed");
        }
    }
}
