//! Danmaku tracks and scored discovery candidates.

use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use super::config::DanmakuConfig;
use super::media::MediaKey;

/// Where a track's content comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A file on local disk next to the media.
    Local,
}

/// One overlay source bound to a media item.
///
/// Identity is `(id, media)`; display name, storage locator and styling are
/// presentation details and do not participate in equality.
#[derive(Debug, Clone)]
pub struct DanmakuTrack {
    /// Stable identifier within the media's track set.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Content source kind.
    pub source: SourceKind,
    /// Storage locator for lazy loading.
    pub file_path: PathBuf,
    /// Intrinsic default styling.
    pub config: DanmakuConfig,
    /// Owning media identity.
    pub media: MediaKey,
}

impl DanmakuTrack {
    /// Create a track with its intrinsic default styling.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        source: SourceKind,
        file_path: impl Into<PathBuf>,
        media: MediaKey,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source,
            file_path: file_path.into(),
            config: DanmakuConfig::default(),
            media,
        }
    }

    /// Copy with different styling.
    pub fn with_config(mut self, config: DanmakuConfig) -> Self {
        self.config = config;
        self
    }
}

impl PartialEq for DanmakuTrack {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.media == other.media
    }
}

impl Eq for DanmakuTrack {}

impl Hash for DanmakuTrack {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.media.hash(state);
    }
}

/// Scored candidate track for a media identity.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackCandidate {
    pub track: DanmakuTrack,
    /// Discovery confidence, higher wins.
    pub score: i32,
    /// Human-readable reason the candidate was suggested.
    pub reason: String,
}

impl TrackCandidate {
    pub fn new(track: DanmakuTrack, score: i32, reason: impl Into<String>) -> Self {
        Self {
            track,
            score,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media() -> MediaKey {
        MediaKey::new("/media/clip.mkv", 1, 2)
    }

    #[test]
    fn equality_ignores_name_and_path() {
        let a = DanmakuTrack::new("t1", "first", SourceKind::Local, "/a.xml", media());
        let b = DanmakuTrack::new("t1", "renamed", SourceKind::Local, "/b.xml", media());
        assert_eq!(a, b);
    }

    #[test]
    fn equality_requires_same_media() {
        let a = DanmakuTrack::new("t1", "n", SourceKind::Local, "/a.xml", media());
        let other_media = MediaKey::new("/media/clip.mkv", 1, 3);
        let b = DanmakuTrack::new("t1", "n", SourceKind::Local, "/a.xml", other_media);
        assert_ne!(a, b);
    }

    #[test]
    fn with_config_replaces_styling() {
        let track = DanmakuTrack::new("t1", "n", SourceKind::Local, "/a.xml", media());
        let styled = track.clone().with_config(DanmakuConfig::default().with_offset(100));
        assert_eq!(styled.config.offset_ms, 100);
        assert_eq!(styled, track);
    }
}
