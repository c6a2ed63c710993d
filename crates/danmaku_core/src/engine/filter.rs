//! Pure item filtering: kind-enable flags and keyword suppression.

use crate::models::{DanmakuConfig, DanmakuItem};

/// Items that survive the config's kind flags and keyword block-list.
///
/// Keyword matching is case-insensitive substring; any match suppresses.
/// An empty block-list suppresses nothing.
pub fn apply_filters(items: &[DanmakuItem], config: &DanmakuConfig) -> Vec<DanmakuItem> {
    items
        .iter()
        .filter(|item| {
            config.kind_enabled.allows(item.kind) && !matches_keyword(item, &config.keyword_filter)
        })
        .cloned()
        .collect()
}

fn matches_keyword(item: &DanmakuItem, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return false;
    }
    let text = item.text.to_lowercase();
    keywords
        .iter()
        .filter(|keyword| !keyword.is_empty())
        .any(|keyword| text.contains(&keyword.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemKind, KindEnabled};

    fn items() -> Vec<DanmakuItem> {
        vec![
            DanmakuItem::new(0, ItemKind::Scroll, "plain"),
            DanmakuItem::new(10, ItemKind::Scroll, "big SPOILER inside"),
            DanmakuItem::new(20, ItemKind::Bottom, "bottom line"),
            DanmakuItem::new(30, ItemKind::Top, "top line"),
        ]
    }

    #[test]
    fn keyword_match_is_case_insensitive_substring() {
        let config = DanmakuConfig {
            keyword_filter: vec!["spoiler".to_string()],
            ..DanmakuConfig::default()
        };
        let filtered = apply_filters(&items(), &config);
        assert_eq!(filtered.len(), 3);
        assert!(filtered.iter().all(|item| !item.text.contains("SPOILER")));
    }

    #[test]
    fn disabled_kind_is_excluded_regardless_of_text() {
        let config = DanmakuConfig {
            kind_enabled: KindEnabled {
                bottom: false,
                ..KindEnabled::default()
            },
            ..DanmakuConfig::default()
        };
        let filtered = apply_filters(&items(), &config);
        assert!(filtered.iter().all(|item| item.kind != ItemKind::Bottom));
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn no_keywords_means_no_suppression() {
        let filtered = apply_filters(&items(), &DanmakuConfig::default());
        assert_eq!(filtered.len(), 4);
    }

    #[test]
    fn empty_keywords_are_ignored() {
        let config = DanmakuConfig {
            keyword_filter: vec![String::new()],
            ..DanmakuConfig::default()
        };
        assert_eq!(apply_filters(&items(), &config).len(), 4);
    }

    #[test]
    fn multiple_keywords_or_together() {
        let config = DanmakuConfig {
            keyword_filter: vec!["bottom".to_string(), "top".to_string()],
            ..DanmakuConfig::default()
        };
        let filtered = apply_filters(&items(), &config);
        assert_eq!(filtered.len(), 2);
    }
}
