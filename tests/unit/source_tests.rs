/*!
 * Tests for the caption source state machine
 */

use std::sync::Arc;
use std::time::Duration;

use bicap::captions::{CaptionSource, Diagnostic, SourceState};
use bicap::errors::{BridgeError, CaptionError, ConstructionError};
use bicap::providers::Vendor;
use crate::common::{self, mocks::{MockFetcher, MockTranslator}};

const EN_URL: &str = "https://example.com/api/timedtext?v=abc&lang=en";

fn english(fetcher: Arc<MockFetcher>) -> Arc<CaptionSource> {
    Arc::new(CaptionSource::native("English", "en", false, Some(EN_URL.to_string()), fetcher).unwrap())
}

async fn ready_english(count: usize) -> Arc<CaptionSource> {
    let source = english(Arc::new(MockFetcher::always(common::sample_transcript(count))));
    source.download().await.unwrap();
    source
}

/// The off track needs no runtime and no work
#[test]
fn test_disabled_download_withoutRuntime_shouldResolveImmediately() {
    let source = Arc::new(CaptionSource::disabled());
    let result = tokio_test::block_on(source.download());

    assert!(result.is_ok());
    assert_eq!(source.state(), SourceState::Ready);
    assert_eq!(source.language_code(), "off");
    assert!(source.lines().is_empty());
}

/// Every observed state change moves forward, ending in Ready
#[tokio::test]
async fn test_download_withSubscriber_shouldOnlyMoveForward() {
    let fetcher = Arc::new(MockFetcher::always(common::sample_transcript(3)).with_delay(Duration::from_millis(20)));
    let source = english(fetcher);
    let mut states = source.subscribe();
    assert_eq!(*states.borrow_and_update(), SourceState::Genesis);

    let download = source.download();
    assert_eq!(source.state(), SourceState::Loading);

    download.await.unwrap();
    states.changed().await.unwrap();
    assert_eq!(*states.borrow_and_update(), SourceState::Ready);
    assert!(source.state().is_terminal());
    assert_eq!(source.lines().len(), 3);
    assert_eq!(source.lines()[2].text, "line 2");
}

/// Concurrent and later calls share one fetch and one outcome
#[tokio::test]
async fn test_download_withConcurrentCalls_shouldFetchOnce() {
    let fetcher = Arc::new(MockFetcher::always(common::sample_transcript(2)).with_delay(Duration::from_millis(20)));
    let source = english(fetcher.clone());

    let results = futures::future::join_all((0..5).map(|_| source.download())).await;
    assert!(results.iter().all(|r| r.is_ok()));
    source.download().await.unwrap();

    assert_eq!(fetcher.requested(), vec![EN_URL.to_string()]);
}

/// Dropping the returned future does not cancel the download
#[tokio::test]
async fn test_download_withDroppedHandle_shouldStillComplete() {
    let fetcher = Arc::new(MockFetcher::always(common::sample_transcript(1)).with_delay(Duration::from_millis(10)));
    let source = english(fetcher);

    drop(source.download());
    let mut states = source.subscribe();
    while !states.borrow_and_update().is_terminal() {
        states.changed().await.unwrap();
    }
    assert_eq!(source.state(), SourceState::Ready);
}

/// A failed fetch settles in Error and later calls see the same error without refetching
#[tokio::test]
async fn test_download_withTransportFailure_shouldStayInError() {
    let fetcher = Arc::new(MockFetcher::new());
    let source = english(fetcher.clone());

    let first = source.download().await.unwrap_err();
    let second = source.download().await.unwrap_err();

    assert!(matches!(first, CaptionError::Transport(_)));
    assert_eq!(first, second);
    assert_eq!(source.state(), SourceState::Error);
    assert!(source.lines().is_empty());
    assert_eq!(fetcher.requested().len(), 1);
}

#[tokio::test]
async fn test_download_withMalformedTranscript_shouldSettleInError() {
    let source = english(Arc::new(MockFetcher::always("<transcript><text start=\"x\">a</text></transcript>")));

    let error = source.download().await.unwrap_err();
    assert!(matches!(error, CaptionError::Parse(_)));
    assert_eq!(source.state(), SourceState::Error);
}

/// Auto-generated fragments are merged in pairs
#[tokio::test]
async fn test_download_withAutoGeneratedTrack_shouldCoalesceFragments() {
    let fetcher = Arc::new(MockFetcher::always(common::sample_transcript(5)));
    let source = Arc::new(
        CaptionSource::native("English (auto-generated)", "en", true, Some(EN_URL.to_string()), fetcher).unwrap(),
    );

    source.download().await.unwrap();
    let lines = source.lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].text, "line 0 line 1");
    assert_eq!(lines[0].start, 0.0);
    assert_eq!(lines[0].end, 2.0);
    assert_eq!(lines[2].text, "line 4");
    assert_eq!(lines.iter().map(|l| l.id).collect::<Vec<_>>(), vec![0, 1, 2]);
}

#[tokio::test]
async fn test_platform_translated_download_withTlangUrl_shouldFetchTranslatedUrl() {
    let fetcher = Arc::new(MockFetcher::new());
    let expected_url = format!("{}&tlang=ja", EN_URL);
    fetcher.respond(&expected_url, common::sample_transcript(2));
    let from = english(fetcher.clone());

    let translated = Arc::new(CaptionSource::platform_translated("YouTube | English → Japanese", "ja", &from).unwrap());
    translated.download().await.unwrap();

    assert_eq!(fetcher.requested(), vec![expected_url]);
    assert_eq!(translated.lines().len(), 2);
    // The pivot itself was never fetched
    assert_eq!(from.state(), SourceState::Genesis);
}

#[tokio::test]
async fn test_platform_translated_withoutSourceUrl_shouldFailConstruction() {
    let from = CaptionSource::native("English", "en", false, None, Arc::new(MockFetcher::new())).unwrap();
    let result = CaptionSource::platform_translated("x", "ja", &from);
    assert!(matches!(result, Err(ConstructionError::MissingSourceUrl(_))));
}

#[tokio::test]
async fn test_vendor_translated_withUnreadySource_shouldFailConstruction() {
    let from = english(Arc::new(MockFetcher::new()));
    let result = CaptionSource::vendor_translated(
        "DeepL | English → Japanese",
        Vendor::DeepL,
        "ja",
        &from,
        Arc::new(MockTranslator::default()),
    );
    assert!(matches!(result, Err(ConstructionError::SourceNotReady(_))));
}

/// Vendor codes are normalized and lines keep the source timing
#[tokio::test]
async fn test_vendor_translated_download_withReadySource_shouldTranslateLines() {
    let from = ready_english(4).await;
    let translator = Arc::new(MockTranslator::default());

    let source = Arc::new(
        CaptionSource::vendor_translated("DeepL | English → Japanese", Vendor::DeepL, "ja", &from, translator.clone())
            .unwrap(),
    );
    assert_eq!(source.language_code(), "JA");
    assert!(source.is_paid());
    assert_eq!(source.vendor(), Some(Vendor::DeepL));

    let (a, b) = tokio::join!(source.download(), source.download());
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(translator.call_count(), 1);

    let lines = source.lines();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[1].text, "[JA] line 1");
    assert_eq!(lines[1].start, from.lines()[1].start);
    assert!(source.diagnostics().is_empty());
}

/// 8 of 10 lines back: Ready with the 8 lines and a diagnostic
#[tokio::test]
async fn test_vendor_translated_download_withShortResponse_shouldTruncateAndRecord() {
    let from = ready_english(10).await;
    let source = Arc::new(
        CaptionSource::vendor_translated("x", Vendor::Tencent, "ja", &from, Arc::new(MockTranslator::dropping(2)))
            .unwrap(),
    );

    source.download().await.unwrap();

    assert_eq!(source.state(), SourceState::Ready);
    assert_eq!(source.lines().len(), 8);
    assert_eq!(
        source.diagnostics(),
        vec![Diagnostic::LineCountMismatch { expected: 10, actual: 8 }]
    );
}

#[tokio::test]
async fn test_vendor_translated_download_withBridgeFailure_shouldSettleInError() {
    let from = ready_english(2).await;
    let translator = Arc::new(MockTranslator::failing(BridgeError::CapabilityDisabled(Vendor::Tencent)));
    let source = Arc::new(CaptionSource::vendor_translated("x", Vendor::Tencent, "ja", &from, translator).unwrap());

    let error = source.download().await.unwrap_err();
    assert_eq!(error, CaptionError::CapabilityDisabled(Vendor::Tencent));
    assert_eq!(source.state(), SourceState::Error);
    assert!(source.lines().is_empty());
}

#[tokio::test]
async fn test_active_lines_withOverlappingTimes_shouldReturnLinesOnScreen() {
    let source = ready_english(3).await;

    let at_one = source.active_lines(1.5);
    assert_eq!(at_one.len(), 1);
    assert_eq!(at_one[0].text, "line 1");
    // Boundary belongs to both neighbours
    assert_eq!(source.active_lines(1.0).len(), 2);
    assert!(source.active_lines(10.0).is_empty());
}
