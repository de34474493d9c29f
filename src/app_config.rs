use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::providers::Vendor;

/// Application configuration module
/// This module handles the settings consumed by the caption pipeline:
/// vendor credentials and feature flags, chunk sizes, and the ordered
/// language preferences that drive auto-selection.
/// Keys are camelCase on disk; any key missing from a file takes its default.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Language codes tried in order for the primary caption
    pub primary_caption_search_codes: Vec<String>,

    /// Language codes tried in order for the secondary caption
    pub secondary_caption_search_codes: Vec<String>,

    /// Offer platform-translated tracks
    pub yt_trans_enabled: bool,

    /// Offer Tencent (TMT) translated tracks
    pub tmt_enabled: bool,

    /// TMT API host, without scheme
    pub tmt_api_host: String,

    pub tmt_secret_id: String,

    pub tmt_secret_key: String,

    pub tmt_region: String,

    pub tmt_project_id: String,

    /// Character budget per TMT request
    pub tmt_chuck_size_cch: usize,

    /// Offer DeepL translated tracks
    pub dmt_enabled: bool,

    /// Full DeepL translate endpoint
    pub dmt_api_endpoint: String,

    pub dmt_api_key: String,

    /// Lines per DeepL request
    pub dmt_chunk_size_lines: usize,

    /// Log level
    pub log_level: LogLevel,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            primary_caption_search_codes: default_primary_codes(),
            secondary_caption_search_codes: default_secondary_codes(),
            yt_trans_enabled: true,
            tmt_enabled: false,
            tmt_api_host: "tmt.tencentcloudapi.com".to_string(),
            tmt_secret_id: String::new(),
            tmt_secret_key: String::new(),
            tmt_region: "ap-hongkong".to_string(),
            tmt_project_id: "0".to_string(),
            tmt_chuck_size_cch: 1950,
            dmt_enabled: false,
            dmt_api_endpoint: "https://api.deepl.com/v2/translate".to_string(),
            dmt_api_key: String::new(),
            dmt_chunk_size_lines: 49,
            log_level: LogLevel::default(),
        }
    }
}

fn default_primary_codes() -> Vec<String> {
    ["zh-TW", "zh-Hant", "zh-CN", "zh"].iter().map(|c| c.to_string()).collect()
}

fn default_secondary_codes() -> Vec<String> {
    ["en-US", "en", "ja"].iter().map(|c| c.to_string()).collect()
}

impl Settings {
    /// Parse settings from JSON, filling every missing key with its default
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse settings JSON")
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .context(format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", path.display()))
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize settings to JSON")?;
        std::fs::write(path, json)
            .context(format!("Failed to write config file: {}", path.display()))
    }

    /// Per-vendor feature flag
    pub fn vendor_enabled(&self, vendor: Vendor) -> bool {
        match vendor {
            Vendor::Tencent => self.tmt_enabled,
            Vendor::DeepL => self.dmt_enabled,
        }
    }

    /// Copy with every credential blanked, safe to hand to the untrusted side
    pub fn redacted(&self) -> Self {
        Self {
            tmt_secret_id: String::new(),
            tmt_secret_key: String::new(),
            dmt_api_key: String::new(),
            ..self.clone()
        }
    }

    /// Validate the settings for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.tmt_enabled {
            if self.tmt_secret_id.is_empty() || self.tmt_secret_key.is_empty() {
                return Err(anyhow!("TMT secret id and secret key are required when TMT is enabled"));
            }
            if self.tmt_api_host.is_empty() {
                return Err(anyhow!("TMT API host is required when TMT is enabled"));
            }
        }
        if self.tmt_chuck_size_cch == 0 {
            return Err(anyhow!("tmtChuckSizeCch must be positive"));
        }

        if self.dmt_enabled && self.dmt_api_key.is_empty() {
            return Err(anyhow!("DeepL API key is required when DeepL is enabled"));
        }
        if self.dmt_chunk_size_lines == 0 {
            return Err(anyhow!("dmtChunkSizeLines must be positive"));
        }

        Ok(())
    }
}
