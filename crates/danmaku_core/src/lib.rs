//! Danmaku overlay core - playback-synced comment overlays with no UI
//! dependencies.
//!
//! Keeps a timed comment overlay aligned with an independently running media
//! player it does not control: extrapolates the playback position from
//! anchors, discovers and lazily parses overlay tracks next to the media
//! file, windows the on-screen item set around the current position, and
//! drives an injected render surface. Rendering, persistence backends and
//! transports are collaborators behind traits; this crate can be embedded by
//! a player frontend or a headless control endpoint alike.

pub mod clock;
pub mod dev;
pub mod engine;
pub mod logging;
pub mod models;
pub mod perf;
pub mod prefs;
pub mod renderer;
pub mod source;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
