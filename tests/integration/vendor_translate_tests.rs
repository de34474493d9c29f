/*!
 * Integration tests for chunked vendor translation through the rate limiter
 */

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use anyhow::Result;
use bicap::app_config::Settings;
use bicap::errors::ProviderError;
use bicap::providers::deepl::DeepL;
use bicap::providers::tencent::Tencent;
use bicap::providers::{TranslationVendor, Vendor, translate_lines};
use bicap::rate_limiter::RateLimiter;
use crate::common::{self, mocks::MockVendor};

/// 10 lines in chunks of 4: three calls, original order and timing kept
#[tokio::test]
async fn test_translate_lines_withThreeChunks_shouldReassembleInOrder() -> Result<()> {
    let vendor = Arc::new(MockVendor::new(Vendor::DeepL, 4));
    let limiter = RateLimiter::new(50);
    let lines = common::sample_lines(10);

    let translated = translate_lines(vendor.clone(), &limiter, &lines, "EN", "JA").await?;

    assert_eq!(vendor.call_count(), 3);
    assert_eq!(translated.len(), 10);
    for (source, result) in lines.iter().zip(&translated) {
        assert_eq!(result.id, source.id);
        assert_eq!(result.start, source.start);
        assert_eq!(result.end, source.end);
        assert_eq!(result.text, format!("{}'", source.text));
    }
    assert!(vendor.languages.lock().iter().all(|(from, to)| from == "EN" && to == "JA"));
    Ok(())
}

/// A short last chunk truncates the result instead of failing it
#[tokio::test]
async fn test_translate_lines_withShortChunk_shouldTruncate() -> Result<()> {
    let vendor = Arc::new(MockVendor {
        short_last_chunk: 2,
        ..MockVendor::new(Vendor::Tencent, 4)
    });
    let limiter = RateLimiter::new(50);

    let translated = translate_lines(vendor, &limiter, &common::sample_lines(10), "en", "ja").await?;

    assert_eq!(translated.len(), 8);
    assert_eq!(translated[7].text, "L7'");
    assert_eq!(translated[7].start, 7.0);
    Ok(())
}

#[tokio::test]
async fn test_translate_lines_withVendorError_shouldFail() {
    let vendor = Arc::new(MockVendor {
        fail: true,
        ..MockVendor::new(Vendor::Tencent, 4)
    });
    let limiter = RateLimiter::new(50);

    let result = translate_lines(vendor, &limiter, &common::sample_lines(5), "en", "ja").await;
    assert!(matches!(result, Err(ProviderError::VendorError { .. })));
}

/// Chunk calls are spaced by the limiter interval
#[tokio::test]
async fn test_translate_lines_withLimiter_shouldSpaceCalls() -> Result<()> {
    let vendor = Arc::new(MockVendor::new(Vendor::DeepL, 2));
    let limiter = RateLimiter::new(10);
    let started = Instant::now();

    translate_lines(vendor.clone(), &limiter, &common::sample_lines(6), "EN", "FR").await?;

    assert_eq!(vendor.calls.load(Ordering::SeqCst), 3);
    assert!(started.elapsed() >= Duration::from_millis(200));
    Ok(())
}

#[tokio::test]
async fn test_translate_lines_withNoLines_shouldMakeNoCalls() -> Result<()> {
    let vendor = Arc::new(MockVendor::new(Vendor::DeepL, 4));
    let translated = translate_lines(vendor.clone(), &RateLimiter::new(5), &[], "EN", "JA").await?;

    assert!(translated.is_empty());
    assert_eq!(vendor.call_count(), 0);
    Ok(())
}

/// DeepL packs a fixed number of lines per call
#[test]
fn test_deepl_chunk_withSettings_shouldUseLineCount() -> Result<()> {
    let settings = Settings {
        dmt_chunk_size_lines: 3,
        ..common::all_enabled_settings()
    };
    let deepl = DeepL::from_settings(reqwest::Client::new(), &settings)?;

    let chunks = deepl.chunk(&common::sample_lines(7));
    assert_eq!(chunks.iter().map(|c| c.len()).collect::<Vec<_>>(), vec![3, 3, 1]);
    assert_eq!(deepl.vendor(), Vendor::DeepL);
    Ok(())
}

/// Tencent packs lines up to a character budget
#[test]
fn test_tencent_chunk_withSettings_shouldUseCharacterBudget() -> Result<()> {
    let settings = Settings {
        tmt_chuck_size_cch: 5,
        ..common::all_enabled_settings()
    };
    let tencent = Tencent::from_settings(reqwest::Client::new(), &settings)?;

    // "L0".."L5" are two characters each
    let chunks = tencent.chunk(&common::sample_lines(6));
    assert_eq!(chunks.iter().map(|c| c.len()).collect::<Vec<_>>(), vec![2, 2, 2]);
    assert_eq!(chunks.concat(), vec!["L0", "L1", "L2", "L3", "L4", "L5"]);
    Ok(())
}

#[test]
fn test_vendor_clients_withoutCredentials_shouldRejectSettings() {
    let settings = Settings::default();
    assert!(matches!(
        DeepL::from_settings(reqwest::Client::new(), &settings),
        Err(ProviderError::InvalidConfig(_))
    ));
    assert!(matches!(
        Tencent::from_settings(reqwest::Client::new(), &settings),
        Err(ProviderError::InvalidConfig(_))
    ));
}
