//! Keyed store of track metadata and lazily parsed item lists.
//!
//! The single source of truth for "what tracks exist for this media" and
//! "what has been parsed so far". Growth is bounded by evicting the least
//! recently used media identities wholesale; the identity owning the active
//! track is never evicted.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::models::{DanmakuConfig, DanmakuItem, DanmakuTrack, MediaKey, TrackCandidate};

/// How many media identities the cache retains by default.
pub const DEFAULT_MAX_MEDIA: usize = 8;

/// Parse state of a cached track.
#[derive(Debug, Clone)]
pub enum ItemsState {
    /// Known from discovery but not parsed yet.
    MetadataOnly,
    /// Parsed; the list may legitimately be empty.
    Materialized(Arc<Vec<DanmakuItem>>),
}

impl ItemsState {
    pub fn is_materialized(&self) -> bool {
        matches!(self, Self::Materialized(_))
    }
}

/// One cached track with its discovery provenance.
#[derive(Debug, Clone)]
pub struct CachedTrack {
    pub track: DanmakuTrack,
    pub items: ItemsState,
    pub config: DanmakuConfig,
    pub score: i32,
    pub reason: String,
}

/// Bounded cache of discovered and parsed tracks.
pub struct TrackCache {
    entries: HashMap<(MediaKey, String), CachedTrack>,
    /// Media identities by recency, most recent last.
    recent_media: Vec<MediaKey>,
    max_media: usize,
}

impl Default for TrackCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_MEDIA)
    }
}

impl TrackCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache retaining at most `max_media` media identities (minimum 1).
    pub fn with_capacity(max_media: usize) -> Self {
        Self {
            entries: HashMap::new(),
            recent_media: Vec::new(),
            max_media: max_media.max(1),
        }
    }

    pub fn get(&self, media: &MediaKey, track_id: &str) -> Option<&CachedTrack> {
        self.entries.get(&(media.clone(), track_id.to_string()))
    }

    pub fn contains(&self, media: &MediaKey, track_id: &str) -> bool {
        self.get(media, track_id).is_some()
    }

    /// Whether any entries exist for `media`.
    pub fn has_media(&self, media: &MediaKey) -> bool {
        self.entries.keys().any(|(key, _)| key == media)
    }

    /// Insert (or replace) an entry, touching its media identity.
    ///
    /// `protected` is the media identity owning the active track; it is
    /// exempt from eviction.
    pub fn insert(&mut self, entry: CachedTrack, protected: Option<&MediaKey>) {
        let media = entry.track.media.clone();
        let key = (media.clone(), entry.track.id.clone());
        self.entries.insert(key, entry);
        self.touch(&media, protected);
    }

    pub fn remove(&mut self, media: &MediaKey, track_id: &str) -> Option<CachedTrack> {
        let removed = self
            .entries
            .remove(&(media.clone(), track_id.to_string()));
        if !self.has_media(media) {
            self.recent_media.retain(|m| m != media);
        }
        removed
    }

    /// Candidates for `media`, sorted by score descending.
    pub fn candidates_for(&self, media: &MediaKey) -> Vec<TrackCandidate> {
        let mut candidates: Vec<TrackCandidate> = self
            .entries
            .values()
            .filter(|entry| entry.track.media == *media)
            .map(|entry| {
                let reason = if entry.reason.is_empty() {
                    "cached".to_string()
                } else {
                    entry.reason.clone()
                };
                TrackCandidate::new(entry.track.clone(), entry.score, reason)
            })
            .collect();
        candidates.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.track.name.cmp(&b.track.name)));
        candidates
    }

    fn touch(&mut self, media: &MediaKey, protected: Option<&MediaKey>) {
        self.recent_media.retain(|m| m != media);
        self.recent_media.push(media.clone());

        while self.recent_media.len() > self.max_media {
            let Some(index) = self
                .recent_media
                .iter()
                .position(|m| protected.map_or(true, |p| m != p))
            else {
                break;
            };
            if self.recent_media[index] == *media {
                // Everything older is protected; live with the overflow.
                break;
            }
            let evicted = self.recent_media.remove(index);
            self.entries.retain(|(m, _), _| *m != evicted);
            debug!(media = %evicted.serialize(), "evicted least recently used media from track cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;

    fn media(n: u64) -> MediaKey {
        MediaKey::new(format!("/media/clip-{n}.mkv"), n, n as i64)
    }

    fn entry(media: MediaKey, id: &str, score: i32) -> CachedTrack {
        let track = DanmakuTrack::new(id, id, SourceKind::Local, format!("/tracks/{id}.xml"), media);
        CachedTrack {
            track,
            items: ItemsState::MetadataOnly,
            config: DanmakuConfig::default(),
            score,
            reason: "extension match".to_string(),
        }
    }

    #[test]
    fn insert_and_get_round_trip() {
        let mut cache = TrackCache::new();
        cache.insert(entry(media(1), "a", 50), None);

        assert!(cache.contains(&media(1), "a"));
        assert!(cache.has_media(&media(1)));
        assert!(!cache.contains(&media(1), "b"));
        assert!(!cache.has_media(&media(2)));
    }

    #[test]
    fn replacing_an_entry_keeps_one_copy() {
        let mut cache = TrackCache::new();
        cache.insert(entry(media(1), "a", 50), None);
        let mut promoted = entry(media(1), "a", 50);
        promoted.items = ItemsState::Materialized(Arc::new(Vec::new()));
        cache.insert(promoted, None);

        assert_eq!(cache.candidates_for(&media(1)).len(), 1);
        assert!(cache.get(&media(1), "a").unwrap().items.is_materialized());
    }

    #[test]
    fn candidates_sorted_by_score_descending() {
        let mut cache = TrackCache::new();
        cache.insert(entry(media(1), "low", 50), None);
        cache.insert(entry(media(1), "high", 100), None);
        cache.insert(entry(media(2), "elsewhere", 80), None);

        let candidates = cache.candidates_for(&media(1));
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].track.id, "high");
        assert_eq!(candidates[1].track.id, "low");
    }

    #[test]
    fn evicts_least_recently_used_media() {
        let mut cache = TrackCache::with_capacity(2);
        cache.insert(entry(media(1), "a", 50), None);
        cache.insert(entry(media(2), "b", 50), None);
        cache.insert(entry(media(3), "c", 50), None);

        assert!(!cache.has_media(&media(1)));
        assert!(cache.has_media(&media(2)));
        assert!(cache.has_media(&media(3)));
    }

    #[test]
    fn touching_media_refreshes_recency() {
        let mut cache = TrackCache::with_capacity(2);
        cache.insert(entry(media(1), "a", 50), None);
        cache.insert(entry(media(2), "b", 50), None);
        // Re-inserting media 1 makes media 2 the oldest.
        cache.insert(entry(media(1), "a2", 50), None);
        cache.insert(entry(media(3), "c", 50), None);

        assert!(cache.has_media(&media(1)));
        assert!(!cache.has_media(&media(2)));
    }

    #[test]
    fn protected_media_is_never_evicted() {
        let mut cache = TrackCache::with_capacity(2);
        let active = media(1);
        cache.insert(entry(active.clone(), "a", 50), Some(&active));
        cache.insert(entry(media(2), "b", 50), Some(&active));
        cache.insert(entry(media(3), "c", 50), Some(&active));

        assert!(cache.has_media(&active));
        assert!(!cache.has_media(&media(2)));
        assert!(cache.has_media(&media(3)));
    }

    #[test]
    fn remove_clears_recency_when_media_is_empty() {
        let mut cache = TrackCache::with_capacity(2);
        cache.insert(entry(media(1), "a", 50), None);
        assert!(cache.remove(&media(1), "a").is_some());
        assert!(!cache.has_media(&media(1)));
        assert!(cache.remove(&media(1), "a").is_none());
    }
}
