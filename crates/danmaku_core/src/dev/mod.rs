//! Debug pathway for injecting canned danmaku without external files.

use crate::engine::DanmakuEngine;
use crate::models::{DanmakuConfig, DanmakuItem, DanmakuTrack, ItemKind, MediaKey, SourceKind};

/// Bind a small synthetic track to `media` and start it playing.
///
/// Useful for verifying a render surface end to end when no track files are
/// available on the device.
pub fn inject_demo_track(engine: &mut DanmakuEngine, media: &MediaKey) {
    let track = DanmakuTrack::new(
        format!("dev-{:x}", md5::compute(media.serialize())),
        "Developer Injected",
        SourceKind::Local,
        "developer",
        media.clone(),
    );
    engine.bind_track(track, sample_items(), DanmakuConfig::default());
    engine.set_visibility(true);
    engine.update_playback_state(0, 1.0, true);
}

fn sample_items() -> Vec<DanmakuItem> {
    vec![
        DanmakuItem::new(0, ItemKind::Scroll, "DFM ready")
            .with_color(0xFF_FF_FF)
            .with_size(20.0),
        DanmakuItem::new(1_000, ItemKind::Top, "Top aligned")
            .with_color(0xFF_99_33)
            .with_size(22.0),
        DanmakuItem::new(2_000, ItemKind::Bottom, "Bottom aligned")
            .with_color(0x33_CC_FF)
            .with_size(22.0),
        DanmakuItem::new(3_000, ItemKind::Scroll, "Sync check")
            .with_color(0xFF_00_FF)
            .with_size(20.0),
    ]
}
