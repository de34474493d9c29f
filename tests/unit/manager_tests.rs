/*!
 * Tests for the caption manager and its search policy
 */

use std::sync::Arc;

use bicap::captions::catalog::{self, PIVOT_LANGUAGE};
use bicap::captions::{CaptionManager, CaptionSource, TrackId};
use bicap::errors::ConstructionError;
use bicap::providers::Vendor;
use crate::common::{self, mocks::{MockFetcher, MockTranslator}};

fn native(name: &str, code: &str, asr: bool, fetcher: &Arc<MockFetcher>) -> CaptionSource {
    let url = format!("https://example.com/api/timedtext?v=abc&lang={}", code);
    CaptionSource::native(name, code, asr, Some(url), fetcher.clone()).unwrap()
}

fn manager_with(tracks: &[(&str, &str, bool)]) -> CaptionManager {
    let fetcher = Arc::new(MockFetcher::always(common::sample_transcript(3)));
    CaptionManager::new(
        tracks
            .iter()
            .map(|(name, code, asr)| native(name, code, *asr, &fetcher))
            .collect(),
    )
}

#[test]
fn test_new_withNativeTracks_shouldPutDisabledFirst() {
    let manager = manager_with(&[("English", "en", false)]);

    assert_eq!(manager.native_tracks().len(), 2);
    assert!(manager.native_tracks()[0].is_disabled());
    assert!(manager.disabled().is_disabled());
    assert!(manager.translated_tracks().is_empty());
    assert_eq!(manager.get(TrackId::Native(1)).unwrap().language_code(), "en");
    assert!(manager.get(TrackId::Translated(0)).is_none());
}

/// Authored tracks win over auto-generated ones for the same language
#[test]
fn test_search_withAuthoredAndAsrTracks_shouldPreferAuthored() {
    let manager = manager_with(&[
        ("English (auto-generated)", "en", true),
        ("English", "en-US", false),
    ]);

    let found = manager.search("en").unwrap();
    assert_eq!(found.display_name(), "English");
    assert!(!found.is_auto_generated());

    let by_language = manager.get_by_language("en").unwrap();
    assert_eq!(by_language.display_name(), "English");
}

#[test]
fn test_search_withOnlyAsrTrack_shouldFallBackToAsr() {
    let manager = manager_with(&[("English (auto-generated)", "en", true)]);

    let found = manager.search("en").unwrap();
    assert!(found.is_auto_generated());
}

/// Native tracks first, then free translated tracks, never paid ones
#[tokio::test]
async fn test_search_withTranslatedTracks_shouldSkipPaidAndPreferNative() {
    let manager = manager_with(&[("English", "en", false), ("Korean", "ko", false)]);
    let pivot = manager.get_by_language(PIVOT_LANGUAGE).unwrap();
    pivot.download().await.unwrap();

    let translator = Arc::new(MockTranslator::default());
    let paid = manager.add_translated(catalog::vendor_batch(Vendor::Tencent, &pivot, translator));
    assert_eq!(paid.len(), 8);

    // Only a paid track exists for Italian
    assert!(manager.search("it").is_none());

    let free = manager.add_translated(catalog::platform_batch(&pivot));
    assert_eq!(free.first(), Some(&TrackId::Translated(8)));

    // Native Korean beats the platform-translated one
    let korean = manager.search("ko").unwrap();
    assert_eq!(korean.display_name(), "Korean");

    // Japanese only exists translated; the free one is picked
    let japanese = manager.search("ja").unwrap();
    assert!(!japanese.is_paid());
    assert_eq!(japanese.display_name(), "YouTube | English → Japanese");

    // Paid tracks stay reachable by explicit id
    let explicit = manager.get(TrackId::Translated(1)).unwrap();
    assert!(explicit.is_paid());
}

#[test]
fn test_search_withCaseAndPrefix_shouldMatchLoosely() {
    let manager = manager_with(&[("Chinese (Traditional)", "zh-Hant", false)]);

    assert!(manager.search("ZH").is_some());
    assert!(manager.search("zh-hant").is_some());
    assert!(manager.search("zh-Hans").is_none());
    assert!(manager.search("").is_none());
}

/// The off sentinel is never a search result
#[test]
fn test_search_withOffCode_shouldNotReturnDisabled() {
    let manager = manager_with(&[]);
    assert!(manager.search("off").is_none());
    assert!(manager.search("o").is_none());
}

#[test]
fn test_add_translated_withFailedConstructions_shouldSkipThem() {
    let manager = manager_with(&[("English", "en", false)]);
    let pivot = manager.get_by_language("en").unwrap();

    let added = manager.add_translated(vec![
        Err(ConstructionError::SourceNotReady("English".to_string())),
        CaptionSource::platform_translated("YouTube | English → French", "fr", &pivot),
    ]);

    assert_eq!(added, vec![TrackId::Translated(0)]);
    assert_eq!(manager.translated_tracks().len(), 1);
    assert_eq!(manager.tracks().len(), 3);
}

#[test]
fn test_track_id_withDisplayAndParse_shouldAgree() {
    assert_eq!(TrackId::Native(2).to_string(), "n2");
    assert_eq!("t7".parse::<TrackId>().unwrap(), TrackId::Translated(7));
    assert_eq!(" n0 ".parse::<TrackId>().unwrap(), TrackId::Native(0));

    assert!("x1".parse::<TrackId>().is_err());
    assert!("n".parse::<TrackId>().is_err());
    assert!("é1".parse::<TrackId>().is_err());
}
