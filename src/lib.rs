/*!
 * # bicap - Bilingual Captions
 *
 * A Rust library for acquiring, translating and pairing video caption tracks.
 *
 * ## Features
 *
 * - Native caption tracks, including auto-generated ones merged into readable lines
 * - Platform translations through the `tlang` URL parameter
 * - Vendor translations:
 *   - Tencent Machine Translation (signed batch API)
 *   - DeepL API
 * - Download-once caption sources with observable state
 * - Tiered language search over native and free translated tracks
 * - A per-vendor FIFO rate limiter
 * - A correlated request/response bridge keeping credentials on the trusted side
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Settings loading, defaults and validation
 * - `captions`: Caption tracks and their selection:
 *   - `captions::source`: The `CaptionSource` state machine
 *   - `captions::manager`: The per-video track set and search policy
 *   - `captions::transcript`: Timed-text parsing
 *   - `captions::catalog`: Translation targets per provider
 * - `providers`: Translation vendor clients:
 *   - `providers::tencent`: Tencent TMT client
 *   - `providers::deepl`: DeepL client
 *   - `providers::chunking`: Line and character chunking
 * - `rate_limiter`: Throttling of outbound vendor calls
 * - `bridge`: Untrusted client, trusted server and wire protocol
 * - `manifest`: Player response model
 * - `session`: Per-video session and auto-selection
 * - `language_utils`: Language code matching and display names
 * - `errors`: Custom error types for the library
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod bridge;
pub mod captions;
pub mod errors;
pub mod language_utils;
pub mod manifest;
pub mod providers;
pub mod rate_limiter;
pub mod session;

// Re-export main types for easier usage
pub use app_config::Settings;
pub use bridge::{BridgeClient, BridgeServer};
pub use captions::{CaptionLine, CaptionManager, CaptionSource, SourceState, TrackId};
pub use errors::{AppError, BridgeError, CaptionError, ConstructionError, ProviderError};
pub use manifest::Manifest;
pub use providers::Vendor;
pub use rate_limiter::RateLimiter;
pub use session::CaptionSession;
