use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};

use crate::app_config::Settings;
use crate::captions::CaptionLine;
use crate::errors::BridgeError;
use crate::providers::Vendor;

/// `err.code` sent when the vendor flag is off on the trusted side
pub const CAPABILITY_DISABLED: &str = "CAPABILITY_DISABLED";
/// `err.code` for vendor clients that cannot be built from the current settings
pub const INVALID_CONFIG: &str = "INVALID_CONFIG";
/// `err.code` for transport, parse and vendor-reported failures
pub const TRANSLATION_FAILED: &str = "TRANSLATION_FAILED";

/// Frames exchanged between the untrusted and the trusted context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BridgeMessage {
    #[serde(rename_all = "camelCase")]
    TranslationRequest {
        request_id: String,
        vendor: Vendor,
        from_lang_code: String,
        to_lang_code: String,
        from_lines: Vec<CaptionLine>,
    },

    /// Exactly one of `translated_lines` and `err` is set
    #[serde(rename_all = "camelCase")]
    TranslationResult {
        vendor: Vendor,
        request_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        translated_lines: Option<Vec<CaptionLine>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        err: Option<RemoteError>,
    },

    /// Current settings, without credentials
    DispatchSettings { settings: Settings },
}

/// Error payload of a failed `TRANSLATION_RESULT`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    pub code: String,
    pub message: String,
}

impl RemoteError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn capability_disabled(vendor: Vendor) -> Self {
        Self::new(CAPABILITY_DISABLED, format!("{} is not enabled", vendor))
    }

    /// Map onto the error the requesting caller sees
    pub fn into_bridge_error(self, vendor: Vendor) -> BridgeError {
        if self.code == CAPABILITY_DISABLED {
            BridgeError::CapabilityDisabled(vendor)
        } else {
            BridgeError::Remote(format!("{}: {}", self.code, self.message))
        }
    }
}

impl BridgeMessage {
    pub fn result(vendor: Vendor, request_id: String, outcome: Result<Vec<CaptionLine>, RemoteError>) -> Self {
        let (translated_lines, err) = match outcome {
            Ok(lines) => (Some(lines), None),
            Err(e) => (None, Some(e)),
        };
        Self::TranslationResult {
            vendor,
            request_id,
            translated_lines,
            err,
        }
    }

    pub fn encode(&self) -> Result<String, BridgeError> {
        serde_json::to_string(self).map_err(|e| BridgeError::Protocol(e.to_string()))
    }

    pub fn decode(frame: &str) -> Result<Self, BridgeError> {
        serde_json::from_str(frame).map_err(|e| BridgeError::Protocol(e.to_string()))
    }
}

/// Millisecond timestamp plus a random suffix, e.g. `1700000000000_k3j9x0a2bq`
pub fn new_request_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}_{}", chrono::Utc::now().timestamp_millis(), suffix)
}
