//! Parser for the bilibili-style comment XML dialect.
//!
//! Maps `<d p="time,mode,size,color,...">text</d>` elements to items. Only
//! the leading four attribute fields are used: seconds, mode code, text
//! size, packed color. Mode codes 1-3 scroll, 4 bottom, 5 top, 7 positioned.

use roxmltree::Document;

use super::{ParseError, TrackParser};
use crate::models::{DanmakuItem, ItemKind};

/// Stateless parser for the comment XML dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct BiliXmlParser;

impl BiliXmlParser {
    pub fn new() -> Self {
        Self
    }
}

impl TrackParser for BiliXmlParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<DanmakuItem>, ParseError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ParseError::Malformed(format!("invalid utf-8: {e}")))?;
        let doc = Document::parse(text)
            .map_err(|e| ParseError::Malformed(format!("xml parse error: {e}")))?;

        let mut items = Vec::new();
        for node in doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "d")
        {
            let Some(p_attr) = node.attribute("p") else {
                continue;
            };
            let body = node.text().unwrap_or("");
            if let Some(item) = parse_entry(p_attr, body) {
                items.push(item);
            }
        }
        Ok(items)
    }
}

/// Decode one entry; malformed attribute data yields `None` (entry skipped).
fn parse_entry(p_attr: &str, text: &str) -> Option<DanmakuItem> {
    let parts: Vec<&str> = p_attr.split(',').collect();
    if parts.len() < 4 {
        return None;
    }
    let seconds: f32 = parts[0].parse().ok()?;
    let mode: i32 = parts[1].parse().ok()?;
    let size: f32 = parts[2].parse().ok()?;
    let color: i64 = parts[3].parse().ok()?;

    let time_ms = (seconds * 1000.0) as i64;
    Some(
        DanmakuItem::new(time_ms, map_mode(mode), text)
            .with_size(size)
            .with_color(color as u32),
    )
}

fn map_mode(mode: i32) -> ItemKind {
    match mode {
        4 => ItemKind::Bottom,
        5 => ItemKind::Top,
        7 => ItemKind::Positioned,
        _ => ItemKind::Scroll,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Result<Vec<DanmakuItem>, ParseError> {
        BiliXmlParser::new().parse(xml.as_bytes())
    }

    #[test]
    fn parses_basic_modes() {
        let xml = "<i>\
            <d p=\"0.5,1,25,16777215,0,0,0,0\">hello</d>\
            <d p=\"2.0,5,30,255,0,0,0,0\">top</d>\
            <d p=\"3.0,4,20,65280,0,0,0,0\">bottom</d>\
            <d p=\"4.0,7,20,255,0,0,0,0\">placed</d>\
            </i>";

        let items = parse(xml).unwrap();
        assert_eq!(items.len(), 4);

        let first = &items[0];
        assert_eq!(first.time_ms, 500);
        assert_eq!(first.kind, ItemKind::Scroll);
        assert_eq!(first.text, "hello");
        assert_eq!(first.size, 25.0);
        assert_eq!(first.color, 16_777_215);

        assert_eq!(items[1].kind, ItemKind::Top);
        assert_eq!(items[2].kind, ItemKind::Bottom);
        assert_eq!(items[3].kind, ItemKind::Positioned);
    }

    #[test]
    fn skips_invalid_entries() {
        let xml = "<i>\
            <d p=\"not-a-number,1,25,0\">broken</d>\
            <d>missing-attr</d>\
            <d p=\"0.1,1,25\">too-few-fields</d>\
            <d p=\"1.0,1,20,255\">ok</d>\
            </i>";

        let items = parse(xml).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "ok");
    }

    #[test]
    fn empty_element_parses_as_empty_text() {
        let items = parse("<i><d p=\"1.0,1,20,255\"/></i>").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "");
    }

    #[test]
    fn broken_document_is_a_malformed_error() {
        let result = parse("<i><d p=\"0.1,1,20,255\">oops");
        assert!(matches!(result, Err(ParseError::Malformed(_))));
    }

    #[test]
    fn invalid_utf8_is_a_malformed_error() {
        let result = BiliXmlParser::new().parse(&[0xff, 0xfe, 0x3c]);
        assert!(matches!(result, Err(ParseError::Malformed(_))));
    }
}
