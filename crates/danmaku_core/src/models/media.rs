//! Media identity used to partition caches and persisted state.

use std::path::PathBuf;

/// Identifies one media item without opening it.
///
/// Built from path + size + mtime so a replaced file with the same name gets
/// fresh overlay state. Serialized form is `path|size|mtime` to allow stable
/// preferences keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaKey {
    /// Absolute path of the media file.
    pub path: PathBuf,
    /// File size in bytes.
    pub size: u64,
    /// Modification time in milliseconds since the epoch.
    pub mtime: i64,
}

impl MediaKey {
    /// Create a new media key.
    pub fn new(path: impl Into<PathBuf>, size: u64, mtime: i64) -> Self {
        Self {
            path: path.into(),
            size,
            mtime,
        }
    }

    /// Stable string form (`path|size|mtime`).
    pub fn serialize(&self) -> String {
        format!("{}|{}|{}", self.path.display(), self.size, self.mtime)
    }

    /// Parse the serialized form back into a key.
    ///
    /// Splits from the right so paths containing `|` keep working.
    pub fn deserialize(raw: &str) -> Option<Self> {
        let mut parts = raw.rsplitn(3, '|');
        let mtime: i64 = parts.next()?.trim().parse().ok()?;
        let size: u64 = parts.next()?.trim().parse().ok()?;
        let path = parts.next()?;
        if path.is_empty() {
            return None;
        }
        Some(Self::new(path, size, mtime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_round_trip() {
        let key = MediaKey::new("/media/clip.mkv", 1024, 99_000);
        let raw = key.serialize();
        assert_eq!(raw, "/media/clip.mkv|1024|99000");
        assert_eq!(MediaKey::deserialize(&raw), Some(key));
    }

    #[test]
    fn deserialize_rejects_garbage() {
        assert_eq!(MediaKey::deserialize(""), None);
        assert_eq!(MediaKey::deserialize("/media/clip.mkv"), None);
        assert_eq!(MediaKey::deserialize("/media/clip.mkv|big|1"), None);
        assert_eq!(MediaKey::deserialize("|1|2"), None);
    }

    #[test]
    fn path_with_separator_survives() {
        let key = MediaKey::new("/odd|name/clip.mkv", 7, 8);
        assert_eq!(MediaKey::deserialize(&key.serialize()), Some(key));
    }
}
