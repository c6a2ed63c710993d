//! Track content sources: document parsing and local candidate discovery.

mod bili_xml;
mod discovery;

pub use bili_xml::BiliXmlParser;
pub use discovery::{LocalTrackDiscovery, TrackDiscovery};

use thiserror::Error;

use crate::models::DanmakuItem;

/// Errors from decoding one danmaku document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document structure is broken.
    #[error("malformed document: {0}")]
    Malformed(String),
    /// Reading the underlying bytes failed.
    #[error("io failure while reading document: {0}")]
    Io(#[from] std::io::Error),
}

/// Decodes raw document bytes into an ordered entry list.
///
/// Individually malformed entries are skipped; a structurally broken
/// document fails the whole call.
pub trait TrackParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<DanmakuItem>, ParseError>;
}
