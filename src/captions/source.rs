/*!
 * Lazy, download-once caption sources.
 *
 * A `CaptionSource` starts in `Genesis`. The first call to `download()`
 * moves it to `Loading` and spawns the fetch (or translation); every later
 * call returns the same shared handle. When the work settles the source
 * becomes `Ready` with its lines, or `Error` with no lines, and stays there.
 */

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use log::{error, info, warn};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::fmt::Debug;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use url::Url;

use super::transcript::parse_transcript;
use super::{CaptionLine, SourceState};
use crate::errors::{BridgeError, CaptionError, ConstructionError};
use crate::providers::Vendor;

type DownloadHandle = Shared<BoxFuture<'static, Result<(), CaptionError>>>;

/// Fetches raw transcript documents
#[async_trait]
pub trait TranscriptFetcher: Send + Sync + Debug {
    /// Fetch the transcript body at `url`
    async fn fetch(&self, url: &str) -> Result<String, CaptionError>;
}

/// Sends a vendor translation across the bridge to the trusted side
#[async_trait]
pub trait RemoteTranslator: Send + Sync + Debug {
    async fn translate(
        &self,
        vendor: Vendor,
        from_lang: &str,
        to_lang: &str,
        lines: Vec<CaptionLine>,
    ) -> Result<Vec<CaptionLine>, BridgeError>;
}

/// Plain HTTP transcript fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, CaptionError> {
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| CaptionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CaptionError::Transport(format!("HTTP {} for {}", status, url)));
        }

        response
            .text()
            .await
            .map_err(|e| CaptionError::Transport(e.to_string()))
    }
}

/// Tolerated inconsistencies recorded while a source downloads
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// The vendor returned a different number of lines than it was sent
    LineCountMismatch { expected: usize, actual: usize },
}

/// What a source is and where its lines come from
#[derive(Debug)]
pub enum SourceKind {
    /// The "off" track
    Disabled,
    /// A track served by the video platform
    NativeTrack {
        url: Option<String>,
        is_auto_generated: bool,
        fetcher: Arc<dyn TranscriptFetcher>,
    },
    /// A native track translated by the platform via the `tlang` parameter
    PlatformTranslated {
        url: String,
        from_lang_code: String,
        fetcher: Arc<dyn TranscriptFetcher>,
    },
    /// Committed lines translated by a vendor across the bridge
    VendorTranslated {
        vendor: Vendor,
        from_lang_code: String,
        from_lines: Arc<Vec<CaptionLine>>,
        translator: Arc<dyn RemoteTranslator>,
    },
}

#[derive(Debug, Default)]
struct SourceData {
    lines: Arc<Vec<CaptionLine>>,
    diagnostics: Vec<Diagnostic>,
}

/// One caption track for one video
pub struct CaptionSource {
    display_name: String,
    /// Provider-specific casing, kept as given
    language_code: String,
    kind: SourceKind,
    state: watch::Sender<SourceState>,
    data: RwLock<SourceData>,
    handle: OnceCell<DownloadHandle>,
}

impl CaptionSource {
    fn with_kind(display_name: String, language_code: String, kind: SourceKind) -> Self {
        let initial = match kind {
            SourceKind::Disabled => SourceState::Ready,
            _ => SourceState::Genesis,
        };
        let (state, _) = watch::channel(initial);
        Self {
            display_name,
            language_code,
            kind,
            state,
            data: RwLock::new(SourceData::default()),
            handle: OnceCell::new(),
        }
    }

    /// The "off" sentinel: ready from the start, no lines
    pub fn disabled() -> Self {
        Self::with_kind("Off".to_string(), "off".to_string(), SourceKind::Disabled)
    }

    /// A platform caption track
    pub fn native(
        display_name: impl Into<String>,
        language_code: impl Into<String>,
        is_auto_generated: bool,
        url: Option<String>,
        fetcher: Arc<dyn TranscriptFetcher>,
    ) -> Result<Self, ConstructionError> {
        let display_name = display_name.into();
        let language_code = language_code.into();
        if language_code.trim().is_empty() {
            return Err(ConstructionError::EmptyLanguageCode(display_name));
        }
        Ok(Self::with_kind(
            display_name,
            language_code,
            SourceKind::NativeTrack {
                url,
                is_auto_generated,
                fetcher,
            },
        ))
    }

    /// A platform translation of the native track `from` into `to_lang_code`
    pub fn platform_translated(
        display_name: impl Into<String>,
        to_lang_code: impl Into<String>,
        from: &CaptionSource,
    ) -> Result<Self, ConstructionError> {
        let display_name = display_name.into();
        let to_lang_code = to_lang_code.into();
        if to_lang_code.trim().is_empty() {
            return Err(ConstructionError::EmptyLanguageCode(display_name));
        }

        let (from_url, fetcher) = match &from.kind {
            SourceKind::NativeTrack { url, fetcher, .. } => {
                let url = url
                    .as_deref()
                    .ok_or_else(|| ConstructionError::MissingSourceUrl(from.display_name.clone()))?;
                (url, fetcher.clone())
            }
            _ => return Err(ConstructionError::UnsupportedSource(from.display_name.clone())),
        };

        let mut url = Url::parse(from_url).map_err(|e| ConstructionError::InvalidUrl {
            url: from_url.to_string(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair("tlang", &to_lang_code);

        Ok(Self::with_kind(
            display_name,
            to_lang_code,
            SourceKind::PlatformTranslated {
                url: url.into(),
                from_lang_code: from.language_code.clone(),
                fetcher,
            },
        ))
    }

    /// A vendor translation of the committed lines of `from`.
    ///
    /// `from` must already be `Ready`; its lines are captured now.
    pub fn vendor_translated(
        display_name: impl Into<String>,
        vendor: Vendor,
        to_lang_code: &str,
        from: &CaptionSource,
        translator: Arc<dyn RemoteTranslator>,
    ) -> Result<Self, ConstructionError> {
        let display_name = display_name.into();
        if to_lang_code.trim().is_empty() {
            return Err(ConstructionError::EmptyLanguageCode(display_name));
        }
        if from.is_disabled() {
            return Err(ConstructionError::UnsupportedSource(from.display_name.clone()));
        }
        if from.state() != SourceState::Ready {
            return Err(ConstructionError::SourceNotReady(from.display_name.clone()));
        }

        Ok(Self::with_kind(
            display_name,
            vendor.normalize_language_code(to_lang_code),
            SourceKind::VendorTranslated {
                vendor,
                from_lang_code: vendor.normalize_language_code(&from.language_code),
                from_lines: from.lines(),
                translator,
            },
        ))
    }

    /// Start the download if it has not started yet and wait for it to settle.
    ///
    /// The work is spawned on the first call, so it keeps running even if the
    /// returned future is dropped. Every call observes the same outcome.
    pub fn download(self: &Arc<Self>) -> impl Future<Output = Result<Arc<Self>, CaptionError>> + Send + 'static {
        let handle = self.handle.get_or_init(|| self.start_download()).clone();
        let this = Arc::clone(self);
        async move { handle.await.map(|()| this) }
    }

    fn start_download(self: &Arc<Self>) -> DownloadHandle {
        if matches!(self.kind, SourceKind::Disabled) {
            return futures::future::ready(Ok(())).boxed().shared();
        }

        self.set_state(SourceState::Loading);
        info!("Downloading {}", self);

        let this = Arc::clone(self);
        let task = tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(this.fetch_lines()).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(_) => Err(CaptionError::Aborted("download task panicked".to_string())),
            };
            this.settle(outcome)
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(CaptionError::Aborted(e.to_string())),
            }
        }
        .boxed()
        .shared()
    }

    async fn fetch_lines(&self) -> Result<(Vec<CaptionLine>, Vec<Diagnostic>), CaptionError> {
        match &self.kind {
            SourceKind::Disabled => Ok((Vec::new(), Vec::new())),
            SourceKind::NativeTrack {
                url,
                is_auto_generated,
                fetcher,
            } => {
                let url = url
                    .as_deref()
                    .ok_or_else(|| CaptionError::MissingUrl(self.display_name.clone()))?;
                let xml = fetcher.fetch(url).await?;
                Ok((parse_transcript(&xml, *is_auto_generated)?, Vec::new()))
            }
            SourceKind::PlatformTranslated { url, fetcher, .. } => {
                let xml = fetcher.fetch(url).await?;
                Ok((parse_transcript(&xml, false)?, Vec::new()))
            }
            SourceKind::VendorTranslated {
                vendor,
                from_lang_code,
                from_lines,
                translator,
            } => {
                let mut lines = translator
                    .translate(*vendor, from_lang_code, &self.language_code, from_lines.to_vec())
                    .await?;

                let mut diagnostics = Vec::new();
                if lines.len() != from_lines.len() {
                    warn!(
                        "{}: number of lines does not match, from={}, to={}",
                        self,
                        from_lines.len(),
                        lines.len()
                    );
                    diagnostics.push(Diagnostic::LineCountMismatch {
                        expected: from_lines.len(),
                        actual: lines.len(),
                    });
                    lines.truncate(from_lines.len());
                }
                Ok((lines, diagnostics))
            }
        }
    }

    fn settle(
        &self,
        outcome: Result<(Vec<CaptionLine>, Vec<Diagnostic>), CaptionError>,
    ) -> Result<(), CaptionError> {
        match outcome {
            Ok((lines, diagnostics)) => {
                let count = lines.len();
                {
                    let mut data = self.data.write();
                    data.lines = Arc::new(lines);
                    data.diagnostics = diagnostics;
                }
                self.set_state(SourceState::Ready);
                info!("Loaded {} ({} lines)", self, count);
                Ok(())
            }
            Err(e) => {
                self.set_state(SourceState::Error);
                error!("Failed to download {}: {}", self, e);
                Err(e)
            }
        }
    }

    fn set_state(&self, state: SourceState) {
        self.state.send_replace(state);
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }

    pub fn state(&self) -> SourceState {
        *self.state.borrow()
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<SourceState> {
        self.state.subscribe()
    }

    /// Committed lines; empty until `Ready`
    pub fn lines(&self) -> Arc<Vec<CaptionLine>> {
        self.data.read().lines.clone()
    }

    /// Lines on screen at `time` seconds
    pub fn active_lines(&self, time: f64) -> Vec<CaptionLine> {
        self.data
            .read()
            .lines
            .iter()
            .filter(|line| line.is_active_at(time))
            .cloned()
            .collect()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.data.read().diagnostics.clone()
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self.kind, SourceKind::Disabled)
    }

    pub fn is_auto_generated(&self) -> bool {
        matches!(
            self.kind,
            SourceKind::NativeTrack {
                is_auto_generated: true,
                ..
            }
        )
    }

    pub fn is_paid(&self) -> bool {
        self.vendor().is_some_and(|vendor| vendor.is_paid())
    }

    pub fn vendor(&self) -> Option<Vendor> {
        match self.kind {
            SourceKind::VendorTranslated { vendor, .. } => Some(vendor),
            _ => None,
        }
    }

    /// Request URL for fetchable tracks
    pub fn url(&self) -> Option<&str> {
        match &self.kind {
            SourceKind::NativeTrack { url, .. } => url.as_deref(),
            SourceKind::PlatformTranslated { url, .. } => Some(url),
            _ => None,
        }
    }
}

impl std::fmt::Debug for CaptionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionSource")
            .field("display_name", &self.display_name)
            .field("language_code", &self.language_code)
            .field("kind", &self.kind)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for CaptionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            SourceKind::Disabled => write!(f, "Disabled"),
            SourceKind::NativeTrack {
                is_auto_generated, ..
            } => write!(
                f,
                "NativeTrack {} ({}{})",
                self.display_name,
                self.language_code,
                if *is_auto_generated { ", auto-generated" } else { "" }
            ),
            SourceKind::PlatformTranslated { .. } => {
                write!(f, "PlatformTranslated {}", self.display_name)
            }
            SourceKind::VendorTranslated { vendor, .. } => {
                write!(f, "{}Translated {}", vendor, self.display_name)
            }
        }
    }
}
