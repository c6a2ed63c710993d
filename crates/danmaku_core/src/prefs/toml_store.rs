//! TOML-file preferences store with atomic writes.
//!
//! Layout: one `[media.<digest>]` table per media identity plus a
//! `[default]` table for the process-wide config. Table keys are the md5
//! digest of the serialized identity (paths make poor TOML keys); the raw
//! identity is kept alongside for debuggability. Config payloads are stored
//! as JSON strings; corrupted payloads are removed on read.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use toml_edit::{value, DocumentMut};
use tracing::warn;

use super::PreferencesStore;
use crate::models::{DanmakuConfig, DanmakuTrack, MediaKey};

/// File-backed preferences store.
pub struct TomlStore {
    path: PathBuf,
}

impl TomlStore {
    /// Create a store backed by the given file path.
    ///
    /// The file is created lazily on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_doc(&self) -> DocumentMut {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => content.parse().unwrap_or_else(|err| {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "preferences file unparseable; starting fresh"
                );
                DocumentMut::new()
            }),
            Err(_) => DocumentMut::new(),
        }
    }

    fn write_doc(&self, doc: &DocumentMut) {
        if let Err(err) = self.atomic_write(&doc.to_string()) {
            warn!(
                path = %self.path.display(),
                error = %err,
                "failed to persist preferences"
            );
        }
    }

    /// Write to a temp file in the same directory, then rename.
    fn atomic_write(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("toml.tmp");
        {
            let mut file = std::fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&temp_path, &self.path)
    }

    fn read_config_string(doc: &DocumentMut, path: &[&str]) -> Option<String> {
        let mut item = doc.get(path[0])?;
        for key in &path[1..] {
            item = item.get(*key)?;
        }
        item.as_str().map(str::to_string)
    }

    fn drop_config_entry(&self, doc: &mut DocumentMut, path: &[&str]) {
        let Some(mut item) = doc.get_mut(path[0]) else {
            return;
        };
        for key in &path[1..path.len() - 1] {
            match item.get_mut(*key) {
                Some(next) => item = next,
                None => return,
            }
        }
        if let Some(table) = item.as_table_like_mut() {
            table.remove(path[path.len() - 1]);
        }
        self.write_doc(doc);
    }

    fn decode_config(&self, doc: &mut DocumentMut, path: &[&str]) -> Option<DanmakuConfig> {
        let raw = Self::read_config_string(doc, path)?;
        match serde_json::from_str(&raw) {
            Ok(config) => Some(config),
            Err(err) => {
                // Corrupted entry, drop it so it cannot block future loads.
                warn!(error = %err, "dropping corrupted config entry");
                self.drop_config_entry(doc, path);
                None
            }
        }
    }
}

fn media_digest(media: &MediaKey) -> String {
    format!("{:x}", md5::compute(media.serialize()))
}

impl PreferencesStore for TomlStore {
    fn save_last_track(&mut self, media: &MediaKey, track: &DanmakuTrack) {
        let mut doc = self.load_doc();
        let digest = media_digest(media);
        doc["media"][digest.as_str()]["key"] = value(media.serialize());
        doc["media"][digest.as_str()]["last_track"] = value(track.id.as_str());
        self.write_doc(&doc);
    }

    fn last_track_id(&self, media: &MediaKey) -> Option<String> {
        let doc = self.load_doc();
        let digest = media_digest(media);
        doc.get("media")?
            .get(digest.as_str())?
            .get("last_track")?
            .as_str()
            .map(str::to_string)
    }

    fn save_config(&mut self, media: &MediaKey, config: &DanmakuConfig) {
        let json = match serde_json::to_string(config) {
            Ok(json) => json,
            Err(err) => {
                warn!(error = %err, "failed to encode config");
                return;
            }
        };
        let mut doc = self.load_doc();
        let digest = media_digest(media);
        doc["media"][digest.as_str()]["key"] = value(media.serialize());
        doc["media"][digest.as_str()]["config"] = value(json);
        self.write_doc(&doc);
    }

    fn config(&mut self, media: &MediaKey) -> Option<DanmakuConfig> {
        let mut doc = self.load_doc();
        let digest = media_digest(media);
        self.decode_config(&mut doc, &["media", digest.as_str(), "config"])
    }

    fn default_config(&mut self) -> Option<DanmakuConfig> {
        let mut doc = self.load_doc();
        self.decode_config(&mut doc, &["default", "config"])
    }

    fn save_default_config(&mut self, config: &DanmakuConfig) {
        let json = match serde_json::to_string(config) {
            Ok(json) => json,
            Err(err) => {
                warn!(error = %err, "failed to encode default config");
                return;
            }
        };
        let mut doc = self.load_doc();
        doc["default"]["config"] = value(json);
        self.write_doc(&doc);
    }

    fn clear(&mut self, media: &MediaKey) {
        let mut doc = self.load_doc();
        let removed = doc
            .get_mut("media")
            .and_then(|item| item.as_table_like_mut())
            .and_then(|tables| tables.remove(&media_digest(media)))
            .is_some();
        if removed {
            self.write_doc(&doc);
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::models::SourceKind;

    fn media() -> MediaKey {
        MediaKey::new("/media/clip.mkv", 1024, 1000)
    }

    fn track(id: &str) -> DanmakuTrack {
        DanmakuTrack::new(id, "clip.xml", SourceKind::Local, "/media/clip.xml", media())
    }

    #[test]
    fn last_track_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = TomlStore::new(dir.path().join("prefs.toml"));

        assert_eq!(store.last_track_id(&media()), None);
        store.save_last_track(&media(), &track("track-1"));
        assert_eq!(store.last_track_id(&media()), Some("track-1".to_string()));

        // Second save overwrites
        store.save_last_track(&media(), &track("track-2"));
        assert_eq!(store.last_track_id(&media()), Some("track-2".to_string()));
    }

    #[test]
    fn config_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = TomlStore::new(dir.path().join("prefs.toml"));

        let config = DanmakuConfig::default().with_offset(450);
        store.save_config(&media(), &config);
        assert_eq!(store.config(&media()), Some(config));

        // Other media stays absent
        let other = MediaKey::new("/media/other.mkv", 5, 5);
        assert_eq!(store.config(&other), None);
    }

    #[test]
    fn corrupted_config_is_dropped_on_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.toml");
        let digest = media_digest(&media());
        std::fs::write(
            &path,
            format!("[media.{digest}]\nconfig = \"{{ not json\"\n"),
        )
        .unwrap();

        let mut store = TomlStore::new(&path);
        assert_eq!(store.config(&media()), None);

        // The broken entry is gone from the file as well.
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("not json"));
    }

    #[test]
    fn unparseable_file_is_treated_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.toml");
        std::fs::write(&path, "this is { not toml").unwrap();

        let mut store = TomlStore::new(&path);
        assert_eq!(store.last_track_id(&media()), None);
        store.save_last_track(&media(), &track("t1"));
        assert_eq!(store.last_track_id(&media()), Some("t1".to_string()));
    }

    #[test]
    fn default_config_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = TomlStore::new(dir.path().join("prefs.toml"));

        assert_eq!(store.default_config(), None);
        let config = DanmakuConfig::default().with_offset(-100);
        store.save_default_config(&config);
        assert_eq!(store.default_config(), Some(config));
    }

    #[test]
    fn clear_forgets_media() {
        let dir = tempdir().unwrap();
        let mut store = TomlStore::new(dir.path().join("prefs.toml"));

        store.save_last_track(&media(), &track("t1"));
        store.save_config(&media(), &DanmakuConfig::default());
        store.clear(&media());

        assert_eq!(store.last_track_id(&media()), None);
        assert_eq!(store.config(&media()), None);
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.toml");
        let mut store = TomlStore::new(&path);

        store.save_last_track(&media(), &track("t1"));
        assert!(path.exists());
        assert!(!path.with_extension("toml.tmp").exists());
    }
}
