/*!
 * Error types for the bicap caption pipeline.
 *
 * Each layer of the pipeline owns one error enum, defined with thiserror:
 * vendor HTTP clients raise `ProviderError`, caption sources settle with a
 * `CaptionError`, the cross-boundary bridge raises `BridgeError`.
 */

use thiserror::Error;

use crate::providers::Vendor;

/// Errors that can occur when talking to a translation vendor API
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The HTTP request could not be sent or the connection dropped
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// The response body was not the payload we expected
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Non-2xx HTTP status
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Body or message returned with the status
        message: String,
    },

    /// A 2xx response carrying a vendor error payload
    #[error("Vendor reported error: {code} - {message}")]
    VendorError {
        /// Vendor specific error code
        code: String,
        /// Human readable message
        message: String,
    },

    /// The vendor client was built from unusable settings
    #[error("Invalid vendor configuration: {0}")]
    InvalidConfig(String),

    /// The rate limiter lost the task before it settled
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}

/// Errors raised by the rate limiter itself
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The task panicked or its worker went away before producing a value
    #[error("scheduled task was dropped before it settled")]
    TaskDropped,
}

/// Failure recorded on a caption source when its download settles in ERROR.
///
/// Cloneable because every caller of `download()` observes the same value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptionError {
    #[error("URL unavailable for {0}")]
    MissingUrl(String),

    #[error("Failed to fetch captions: {0}")]
    Transport(String),

    #[error("Failed to parse captions: {0}")]
    Parse(String),

    #[error("Translation failed: {0}")]
    Vendor(String),

    #[error("{0} translation is not enabled")]
    CapabilityDisabled(Vendor),

    #[error("Bridge error: {0}")]
    Bridge(String),

    #[error("Download aborted: {0}")]
    Aborted(String),
}

/// Errors returned when a caption source cannot be constructed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstructionError {
    #[error("Caption '{0}' has an empty language code")]
    EmptyLanguageCode(String),

    #[error("Caption '{0}' has no source URL to derive from")]
    MissingSourceUrl(String),

    #[error("Invalid caption URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Caption '{0}' has no committed lines to translate from")]
    SourceNotReady(String),

    #[error("Caption '{0}' cannot be used as a translation source")]
    UnsupportedSource(String),
}

/// Errors on the untrusted side of the bridge
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// No channel and the single reconnect attempt failed
    #[error("Failed to connect to the trusted context: {0}")]
    ConnectFailed(String),

    /// The channel closed while the request was outstanding
    #[error("Bridge channel disconnected")]
    Disconnected,

    /// Refused locally or remotely because the vendor flag is off
    #[error("{0} translation is not enabled")]
    CapabilityDisabled(Vendor),

    /// The trusted context answered with an error payload
    #[error("Remote translation failed: {0}")]
    Remote(String),

    /// A frame could not be encoded or decoded
    #[error("Bridge protocol error: {0}")]
    Protocol(String),
}

impl From<BridgeError> for CaptionError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::CapabilityDisabled(vendor) => Self::CapabilityDisabled(vendor),
            BridgeError::Remote(message) => Self::Vendor(message),
            other => Self::Bridge(other.to_string()),
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a vendor client
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from a caption source
    #[error("Caption error: {0}")]
    Caption(#[from] CaptionError),

    /// Error from the bridge
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
