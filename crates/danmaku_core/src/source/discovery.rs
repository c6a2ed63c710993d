//! Best-effort discovery of danmaku tracks next to the media file.

use crate::models::{DanmakuTrack, MediaKey, SourceKind, TrackCandidate};

/// Produces scored candidate tracks for a media identity.
pub trait TrackDiscovery {
    fn discover(&self, media: &MediaKey) -> Vec<TrackCandidate>;
}

/// Scans the media file's directory for `.xml` siblings and scores them by
/// basename affinity with the media file.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalTrackDiscovery;

impl LocalTrackDiscovery {
    pub fn new() -> Self {
        Self
    }
}

impl TrackDiscovery for LocalTrackDiscovery {
    fn discover(&self, media: &MediaKey) -> Vec<TrackCandidate> {
        let Some(parent) = media.path.parent() else {
            return Vec::new();
        };
        let Some(video_name) = media.path.file_name().and_then(|n| n.to_str()) else {
            return Vec::new();
        };
        let video_base = base_name(video_name);

        let Ok(entries) = std::fs::read_dir(parent) else {
            return Vec::new();
        };

        let mut candidates = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.to_ascii_lowercase().ends_with(".xml") {
                continue;
            }
            let base = base_name(name);
            let track = DanmakuTrack::new(
                path.to_string_lossy().into_owned(),
                name,
                SourceKind::Local,
                path.clone(),
                media.clone(),
            );
            candidates.push(TrackCandidate::new(
                track,
                score(video_base, base),
                reason(video_base, base),
            ));
        }

        candidates.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.track.name.cmp(&b.track.name))
        });
        candidates
    }
}

fn base_name(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}

fn score(video_base: &str, candidate_base: &str) -> i32 {
    if candidate_base.eq_ignore_ascii_case(video_base) {
        100
    } else if candidate_base.starts_with(video_base) {
        90
    } else if video_base.starts_with(candidate_base) {
        85
    } else if candidate_base.contains(video_base) {
        80
    } else {
        50
    }
}

fn reason(video_base: &str, candidate_base: &str) -> &'static str {
    if candidate_base.eq_ignore_ascii_case(video_base) {
        "same-name match"
    } else if candidate_base.starts_with(video_base) || video_base.starts_with(candidate_base) {
        "prefix match"
    } else if candidate_base.contains(video_base) {
        "contains match"
    } else {
        "extension match"
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn prefers_same_name_xml_and_sorts_by_score() {
        let dir = tempdir().unwrap();
        let video = dir.path().join("movie.mkv");
        let same_name = dir.path().join("movie.xml");
        let variant = dir.path().join("movie.zh.xml");
        let other = dir.path().join("other.xml");
        for path in [&video, &same_name, &variant, &other] {
            File::create(path).unwrap();
        }
        // Non-xml siblings are ignored
        File::create(dir.path().join("movie.ass")).unwrap();

        let media = MediaKey::new(&video, 10, 20);
        let candidates = LocalTrackDiscovery::new().discover(&media);

        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].track.id, same_name.to_string_lossy());
        assert_eq!(candidates[0].reason, "same-name match");
        assert!(candidates[0].score > candidates[1].score);
        assert!(candidates[1].score > candidates[2].score);
        assert_eq!(candidates[1].track.id, variant.to_string_lossy());
        assert_eq!(candidates[2].track.id, other.to_string_lossy());
    }

    #[test]
    fn missing_directory_yields_nothing() {
        let media = MediaKey::new("/no/such/dir/clip.mkv", 1, 1);
        assert!(LocalTrackDiscovery::new().discover(&media).is_empty());
    }

    #[test]
    fn ties_break_by_name() {
        let dir = tempdir().unwrap();
        let video = dir.path().join("clip.mkv");
        let b = dir.path().join("unrelated-b.xml");
        let a = dir.path().join("unrelated-a.xml");
        for path in [&video, &b, &a] {
            File::create(path).unwrap();
        }

        let media = MediaKey::new(&video, 1, 1);
        let candidates = LocalTrackDiscovery::new().discover(&media);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].track.name, "unrelated-a.xml");
        assert_eq!(candidates[1].track.name, "unrelated-b.xml");
    }
}
