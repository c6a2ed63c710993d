//! Normalized danmaku entries produced by parsing.

/// Where an entry is laid out on the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Scrolls across the screen (the common case).
    Scroll,
    /// Pinned to the top.
    Top,
    /// Pinned to the bottom.
    Bottom,
    /// Placed at an explicit coordinate.
    Positioned,
}

/// Explicit coordinate for [`ItemKind::Positioned`] entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// One timed overlay entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DanmakuItem {
    /// Time offset into the media, in milliseconds.
    pub time_ms: i64,
    /// Layout kind.
    pub kind: ItemKind,
    /// Text content.
    pub text: String,
    /// RGB color as packed integer.
    pub color: u32,
    /// Base text size.
    pub size: f32,
    /// Base opacity (0.0 - 1.0).
    pub alpha: f32,
    /// Coordinate, meaningful only for positioned entries.
    pub position: Option<Position>,
}

impl DanmakuItem {
    /// Create a new entry with default styling.
    pub fn new(time_ms: i64, kind: ItemKind, text: impl Into<String>) -> Self {
        Self {
            time_ms,
            kind,
            text: text.into(),
            color: 0xFF_FF_FF,
            size: 25.0,
            alpha: 1.0,
            position: None,
        }
    }

    /// Set the color.
    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    /// Set the base text size.
    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    /// Set the base opacity.
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set an explicit coordinate.
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Some(Position { x, y });
        self
    }
}
