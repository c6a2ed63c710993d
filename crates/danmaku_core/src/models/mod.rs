//! Data models for the danmaku overlay core.
//!
//! - Media identity (path + size + mtime) partitioning all cached state
//! - Timed overlay entries and their layout kinds
//! - Tracks and scored discovery candidates
//! - Per-media styling/filtering/timing configuration

mod config;
mod item;
mod media;
mod track;

// Re-export all public types
pub use config::{DanmakuConfig, KindEnabled};
pub use item::{DanmakuItem, ItemKind, Position};
pub use media::MediaKey;
pub use track::{DanmakuTrack, SourceKind, TrackCandidate};
