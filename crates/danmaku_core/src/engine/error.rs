//! Typed load failures surfaced to the host as a queryable last-error.

use std::fmt;
use std::path::PathBuf;

/// Why a track failed to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorReason {
    /// The backing file does not exist.
    Missing,
    /// A metadata-only entry could not be promoted to a parsed one.
    ParseFailed,
    /// Reading the backing file failed.
    Io,
    /// The document structure is broken.
    Malformed,
}

impl fmt::Display for LoadErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Missing => "missing",
            Self::ParseFailed => "parse_failed",
            Self::Io => "io",
            Self::Malformed => "malformed",
        };
        write!(f, "{name}")
    }
}

/// Failure of the most recent load attempt.
///
/// Recorded on the engine instead of being returned; the engine stays in its
/// last good state and the host surfaces this as a dismissable notice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason} while loading '{}'", .path.display())]
pub struct LoadError {
    /// Path of the track that failed.
    pub path: PathBuf,
    /// Failure category.
    pub reason: LoadErrorReason,
}

impl LoadError {
    pub fn new(path: impl Into<PathBuf>, reason: LoadErrorReason) -> Self {
        Self {
            path: path.into(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_are_stable() {
        assert_eq!(LoadErrorReason::Missing.to_string(), "missing");
        assert_eq!(LoadErrorReason::ParseFailed.to_string(), "parse_failed");
        assert_eq!(LoadErrorReason::Io.to_string(), "io");
        assert_eq!(LoadErrorReason::Malformed.to_string(), "malformed");

        let error = LoadError::new("/tmp/a.xml", LoadErrorReason::Missing);
        assert_eq!(error.to_string(), "missing while loading '/tmp/a.xml'");
    }
}
