//! Styling, density and filtering options attached to a danmaku track.

use serde::{Deserialize, Serialize};

use super::item::ItemKind;

/// Per-media styling, filtering and timing configuration.
///
/// Equality is full structural equality so persisted configs can be compared
/// against freshly supplied ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DanmakuConfig {
    /// Text scale factor (1.0 = normal).
    #[serde(default = "default_factor")]
    pub text_scale: f32,
    /// Scroll speed factor (1.0 = normal).
    #[serde(default = "default_factor")]
    pub scroll_speed_factor: f32,
    /// Overlay opacity (1.0 = opaque).
    #[serde(default = "default_factor")]
    pub alpha: f32,
    /// Maximum simultaneous entries (0 = renderer default).
    #[serde(default)]
    pub max_on_screen: u32,
    /// Maximum scroll lines (0 = renderer default).
    #[serde(default)]
    pub max_lines: u32,
    /// Entries containing any of these keywords are suppressed.
    #[serde(default)]
    pub keyword_filter: Vec<String>,
    /// Per-kind enable flags.
    #[serde(default)]
    pub kind_enabled: KindEnabled,
    /// Time offset applied to every entry, in milliseconds.
    #[serde(default)]
    pub offset_ms: i64,
}

fn default_factor() -> f32 {
    1.0
}

impl Default for DanmakuConfig {
    fn default() -> Self {
        Self {
            text_scale: 1.0,
            scroll_speed_factor: 1.0,
            alpha: 1.0,
            max_on_screen: 0,
            max_lines: 0,
            keyword_filter: Vec::new(),
            kind_enabled: KindEnabled::default(),
            offset_ms: 0,
        }
    }
}

impl DanmakuConfig {
    /// Copy with the time offset shifted by `delta_ms`.
    pub fn with_offset(&self, delta_ms: i64) -> Self {
        Self {
            offset_ms: self.offset_ms + delta_ms,
            ..self.clone()
        }
    }

    /// Parse a comma-separated keyword string into a trimmed, non-empty list.
    pub fn parse_keywords(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Format a keyword list back into its comma-separated form.
    pub fn format_keywords(keywords: &[String]) -> String {
        keywords.join(", ")
    }
}

/// Which entry kinds are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindEnabled {
    #[serde(default = "default_true")]
    pub scroll: bool,
    #[serde(default = "default_true")]
    pub top: bool,
    #[serde(default = "default_true")]
    pub bottom: bool,
    #[serde(default = "default_true")]
    pub positioned: bool,
}

fn default_true() -> bool {
    true
}

impl Default for KindEnabled {
    fn default() -> Self {
        Self {
            scroll: true,
            top: true,
            bottom: true,
            positioned: true,
        }
    }
}

impl KindEnabled {
    /// Whether entries of `kind` are shown.
    pub fn allows(&self, kind: ItemKind) -> bool {
        match kind {
            ItemKind::Scroll => self.scroll,
            ItemKind::Top => self.top,
            ItemKind::Bottom => self.bottom,
            ItemKind::Positioned => self.positioned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_offset_shifts_only_offset() {
        let config = DanmakuConfig::default();
        let shifted = config.with_offset(300);
        assert_eq!(shifted.offset_ms, 300);
        assert_eq!(shifted.with_offset(-100).offset_ms, 200);
        assert_eq!(shifted.text_scale, config.text_scale);
    }

    #[test]
    fn equality_detects_offset_change() {
        let config = DanmakuConfig::default();
        assert_eq!(config, DanmakuConfig::default());
        assert_ne!(config, config.with_offset(1));
    }

    #[test]
    fn keyword_parsing_trims_and_drops_empties() {
        let parsed = DanmakuConfig::parse_keywords(" spoiler, , leak ,\t");
        assert_eq!(parsed, vec!["spoiler".to_string(), "leak".to_string()]);
        assert!(DanmakuConfig::parse_keywords("   ").is_empty());
        assert_eq!(DanmakuConfig::format_keywords(&parsed), "spoiler, leak");
    }

    #[test]
    fn kind_flags_gate_each_kind() {
        let enabled = KindEnabled {
            bottom: false,
            ..KindEnabled::default()
        };
        assert!(enabled.allows(ItemKind::Scroll));
        assert!(enabled.allows(ItemKind::Top));
        assert!(!enabled.allows(ItemKind::Bottom));
    }

    #[test]
    fn json_round_trip_applies_defaults() {
        let config = DanmakuConfig::default().with_offset(250);
        let json = serde_json::to_string(&config).unwrap();
        let back: DanmakuConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        // Missing fields fall back to defaults rather than failing.
        let sparse: DanmakuConfig = serde_json::from_str(r#"{"offset_ms": 42}"#).unwrap();
        assert_eq!(sparse.offset_ms, 42);
        assert_eq!(sparse.text_scale, 1.0);
        assert!(sparse.kind_enabled.scroll);
    }
}
