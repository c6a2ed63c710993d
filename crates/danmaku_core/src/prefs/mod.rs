//! Persisted per-media selection and configuration.

mod toml_store;

pub use toml_store::TomlStore;

use crate::models::{DanmakuConfig, DanmakuTrack, MediaKey};

/// Storage contract for remembering track selection and styling per media.
///
/// Implementations must never fail the caller for storage problems: writes
/// are best-effort (failures logged), and reads that encounter corrupted
/// payloads drop them and report absence. Reads of config payloads take
/// `&mut self` because dropping a corrupted entry mutates the store.
pub trait PreferencesStore {
    /// Remember `track` as the last selection for `media`.
    fn save_last_track(&mut self, media: &MediaKey, track: &DanmakuTrack);

    /// Last selected track id for `media`, if any.
    fn last_track_id(&self, media: &MediaKey) -> Option<String>;

    /// Persist the per-media config.
    fn save_config(&mut self, media: &MediaKey, config: &DanmakuConfig);

    /// Per-media config, if present and intact.
    fn config(&mut self, media: &MediaKey) -> Option<DanmakuConfig>;

    /// Process-wide default config, if present and intact.
    fn default_config(&mut self) -> Option<DanmakuConfig>;

    /// Persist the process-wide default config.
    fn save_default_config(&mut self, config: &DanmakuConfig);

    /// Forget everything stored for `media`.
    fn clear(&mut self, media: &MediaKey);
}
