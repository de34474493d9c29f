/*!
 * Translation vendor clients.
 *
 * Two vendors are supported:
 * - Tencent Machine Translation (TMT): signed batch API, chunks by character budget
 * - DeepL: keyed API, chunks by line count
 *
 * Both implement `TranslationVendor`; `translate_lines` drives either of them
 * through a shared `RateLimiter` and reconciles the chunk results back onto
 * the source timeline.
 */

use async_trait::async_trait;
use futures::future::try_join_all;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

use crate::captions::CaptionLine;
use crate::errors::ProviderError;
use crate::rate_limiter::RateLimiter;

pub mod chunking;
pub mod deepl;
pub mod tencent;

/// Default number of vendor calls admitted per second
pub const DEFAULT_VENDOR_QPS: u32 = 5;

/// Third-party translation vendor identity, as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vendor {
    #[serde(rename = "TMT")]
    Tencent,
    #[serde(rename = "DeepL")]
    DeepL,
}

impl Vendor {
    /// All supported vendors
    pub const ALL: [Vendor; 2] = [Vendor::Tencent, Vendor::DeepL];

    /// Name shown in track labels
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Tencent => "Tencent",
            Self::DeepL => "DeepL",
        }
    }

    /// Vendor tracks cost money per call
    pub fn is_paid(&self) -> bool {
        true
    }

    /// Convert a language code to the casing the vendor API expects
    pub fn normalize_language_code(&self, code: &str) -> String {
        match self {
            Self::Tencent => code.to_string(),
            Self::DeepL => code.to_uppercase(),
        }
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Common contract for chunked translation vendors
#[async_trait]
pub trait TranslationVendor: Send + Sync + Debug {
    /// Vendor identity
    fn vendor(&self) -> Vendor;

    /// Split line texts into per-call chunks; every line lands in exactly one chunk
    fn chunk(&self, lines: &[CaptionLine]) -> Vec<Vec<String>>;

    /// Translate one chunk with a single outbound call
    ///
    /// # Returns
    /// * `Result<Vec<String>, ProviderError>` - Translated texts in chunk order
    async fn translate_chunk(
        &self,
        chunk: Vec<String>,
        from_lang: &str,
        to_lang: &str,
    ) -> Result<Vec<String>, ProviderError>;
}

/// Line count drift between what was sent and what came back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCountMismatch {
    pub expected: usize,
    pub actual: usize,
}

/// Translate `lines` through `vendor`, one rate-limited call per chunk.
///
/// Chunks are dispatched together and may complete in any order; the output
/// keeps the original line order and timing. A line-count mismatch only
/// truncates the result.
pub async fn translate_lines(
    vendor: Arc<dyn TranslationVendor>,
    limiter: &RateLimiter,
    lines: &[CaptionLine],
    from_lang: &str,
    to_lang: &str,
) -> Result<Vec<CaptionLine>, ProviderError> {
    let chunks = vendor.chunk(lines);
    debug!(
        "{}: translating {} lines in {} chunks ({} -> {})",
        vendor.vendor(),
        lines.len(),
        chunks.len(),
        from_lang,
        to_lang
    );

    let calls = chunks.into_iter().enumerate().map(|(index, chunk)| {
        let vendor = vendor.clone();
        let from_lang = from_lang.to_string();
        let to_lang = to_lang.to_string();
        let scheduled = limiter.schedule(move || async move {
            debug!("{}: chunk {} ({} lines)", vendor.vendor(), index, chunk.len());
            vendor.translate_chunk(chunk, &from_lang, &to_lang).await
        });
        async move { scheduled.await.map_err(ProviderError::from).and_then(|result| result) }
    });

    let translated_chunks = try_join_all(calls).await?;
    let texts: Vec<String> = translated_chunks.into_iter().flatten().collect();

    let (translated, mismatch) = reconcile(lines, texts);
    if let Some(mismatch) = mismatch {
        warn!(
            "{}: number of lines does not match, from={}, to={}",
            vendor.vendor(),
            mismatch.expected,
            mismatch.actual
        );
    }
    Ok(translated)
}

/// Zip translated texts onto the source timeline.
///
/// The result has `min(texts, lines)` entries; line `i` keeps the id, start
/// and end of source line `i`.
pub fn reconcile(
    from_lines: &[CaptionLine],
    texts: Vec<String>,
) -> (Vec<CaptionLine>, Option<LineCountMismatch>) {
    let returned = texts.len();
    let translated: Vec<CaptionLine> = from_lines
        .iter()
        .zip(texts)
        .enumerate()
        .map(|(id, (line, text))| CaptionLine {
            id,
            start: line.start,
            end: line.end,
            text,
        })
        .collect();

    let mismatch = (returned != from_lines.len()).then_some(LineCountMismatch {
        expected: from_lines.len(),
        actual: returned,
    });
    (translated, mismatch)
}
