//! Render-surface abstraction driven by the engine.
//!
//! The engine never owns pixels; it pushes windowed item sets and transport
//! state to an injected surface. Every fallible call returns a typed error
//! so the engine can degrade to "not prepared" and retry on a later tick.

use thiserror::Error;

use crate::models::{DanmakuConfig, DanmakuItem};

/// Failures reported by a render surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The surface cannot accept calls in its current lifecycle state.
    #[error("surface not ready: {0}")]
    NotReady(String),
    /// The underlying rendering backend failed.
    #[error("surface backend failure: {0}")]
    Backend(String),
}

impl SurfaceError {
    /// Create a backend failure.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Create a not-ready failure.
    pub fn not_ready(message: impl Into<String>) -> Self {
        Self::NotReady(message.into())
    }
}

/// Rendering surface contract.
///
/// Implementations draw and animate the overlay; the engine drives the
/// lifecycle (`prepare` / transport calls / `release`) and tolerates any
/// error by re-preparing later.
pub trait DanmakuRenderer {
    /// Materialize an item set with the given styling.
    fn prepare(&mut self, items: &[DanmakuItem], config: &DanmakuConfig) -> Result<(), SurfaceError>;

    /// Start or resume animation.
    fn play(&mut self) -> Result<(), SurfaceError>;

    /// Freeze animation.
    fn pause(&mut self) -> Result<(), SurfaceError>;

    /// Jump to a playback position in milliseconds.
    fn seek_to(&mut self, position_ms: i64) -> Result<(), SurfaceError>;

    /// Match the player's playback speed.
    fn set_speed(&mut self, speed: f32) -> Result<(), SurfaceError>;

    /// Show or hide the overlay.
    fn set_visible(&mut self, visible: bool) -> Result<(), SurfaceError>;

    /// Whether the overlay is currently shown.
    fn is_visible(&self) -> bool;

    /// Whether a prepared item set is loaded.
    fn is_prepared(&self) -> bool;

    /// Release surface resources.
    fn release(&mut self) -> Result<(), SurfaceError>;
}
