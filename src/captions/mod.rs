/*!
 * Caption tracks and their selection.
 *
 * - `source`: the lazy, download-once `CaptionSource` state machine
 * - `manager`: the per-video set of sources and the search policy over them
 * - `transcript`: timed-text XML parsing and auto-generated line merging
 * - `catalog`: the translation targets offered for each provider
 */

use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod manager;
pub mod source;
pub mod transcript;

pub use manager::{CaptionManager, TrackId};
pub use source::{CaptionSource, Diagnostic, HttpFetcher, RemoteTranslator, SourceKind, TranscriptFetcher};

/// One timed caption line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionLine {
    /// Dense, 0-based position in the track
    pub id: usize,
    /// Start in seconds
    pub start: f64,
    /// End in seconds
    pub end: f64,
    pub text: String,
}

impl CaptionLine {
    pub fn new(id: usize, start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            id,
            start,
            end,
            text: text.into(),
        }
    }

    /// Whether the line is on screen at `time` seconds
    pub fn is_active_at(&self, time: f64) -> bool {
        self.start <= time && time <= self.end
    }
}

/// Lifecycle of a caption source.
///
/// Moves `Genesis -> Loading -> Ready | Error` and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceState {
    Genesis,
    Loading,
    Ready,
    Error,
}

impl SourceState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }
}

impl std::fmt::Display for SourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Genesis => "GENESIS",
            Self::Loading => "LOADING",
            Self::Ready => "READY",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}
