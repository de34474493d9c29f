/*!
 * Video manifest (player response) model.
 *
 * Only the parts the caption pipeline reads are modelled: the video id and
 * the caption track list. A manifest may be a bare player response or an
 * object wrapping it under `playerResponse` / `player_response`, either as
 * a nested object or as an embedded JSON string.
 */

use anyhow::{anyhow, Context, Result};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use crate::captions::{CaptionSource, TranscriptFetcher};

static WATCH_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"youtube\.com/watch.*(?:\?|&)v=([a-zA-Z0-9_\-]+)").unwrap());

const WRAPPER_KEYS: [&str; 2] = ["playerResponse", "player_response"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub video_details: Option<VideoDetails>,
    #[serde(default)]
    pub captions: Option<Captions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Captions {
    #[serde(default)]
    pub player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracklistRenderer {
    #[serde(default)]
    pub caption_tracks: Option<Vec<CaptionTrack>>,
}

/// One entry of `captionTracks`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    #[serde(default)]
    pub name: Option<TrackName>,
    pub language_code: String,
    /// `"asr"` for auto-generated tracks
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackName {
    #[serde(default)]
    pub simple_text: Option<String>,
    #[serde(default)]
    pub runs: Option<Vec<TextRun>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
}

impl CaptionTrack {
    pub fn is_auto_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    /// Track label, falling back to the language code
    pub fn display_name(&self) -> String {
        self.name
            .as_ref()
            .and_then(|name| {
                name.simple_text.clone().or_else(|| {
                    name.runs
                        .as_ref()
                        .map(|runs| runs.iter().map(|run| run.text.as_str()).collect::<String>())
                })
            })
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.language_code.clone())
    }
}

impl Manifest {
    /// Parse a manifest from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).context("Manifest is not valid JSON")?;
        Self::from_value(value)
    }

    /// Parse a manifest from a JSON value, unwrapping a player response wrapper
    pub fn from_value(mut value: Value) -> Result<Self> {
        for key in WRAPPER_KEYS {
            if let Some(inner) = value.get_mut(key).map(Value::take) {
                value = match inner {
                    Value::String(embedded) => serde_json::from_str(&embedded)
                        .context(format!("Embedded '{}' is not valid JSON", key))?,
                    other => other,
                };
                break;
            }
        }
        serde_json::from_value(value).context("Manifest does not match the player response shape")
    }

    /// Load a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .context(format!("Failed to read manifest: {}", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn video_id(&self) -> Option<&str> {
        self.video_id
            .as_deref()
            .or_else(|| self.video_details.as_ref().and_then(|d| d.video_id.as_deref()))
    }

    pub fn title(&self) -> Option<&str> {
        self.video_details.as_ref().and_then(|d| d.title.as_deref())
    }

    /// Caption tracks, or `None` when the manifest carries no caption list
    pub fn caption_tracks(&self) -> Option<&[CaptionTrack]> {
        self.captions
            .as_ref()?
            .player_captions_tracklist_renderer
            .as_ref()?
            .caption_tracks
            .as_deref()
    }

    /// Build native caption sources; tracks that cannot be constructed are logged and skipped
    pub fn native_sources(&self, fetcher: Arc<dyn TranscriptFetcher>) -> Result<Vec<CaptionSource>> {
        let tracks = self
            .caption_tracks()
            .ok_or_else(|| anyhow!("No captions available"))?;

        Ok(tracks
            .iter()
            .filter_map(|track| {
                CaptionSource::native(
                    track.display_name(),
                    track.language_code.clone(),
                    track.is_auto_generated(),
                    track.base_url.clone(),
                    fetcher.clone(),
                )
                .map_err(|e| warn!("Skipping native caption: {}", e))
                .ok()
            })
            .collect())
    }
}

/// Video id from a `youtube.com/watch?...v=<id>` URL
pub fn extract_video_id_from_url(url: &str) -> Option<String> {
    WATCH_URL
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
