/*!
 * Tests for player response parsing
 */

use std::sync::Arc;

use anyhow::Result;
use bicap::captions::SourceState;
use bicap::manifest::Manifest;
use crate::common::{self, mocks::MockFetcher};

#[test]
fn test_from_json_str_withCaptionTracks_shouldReadTracks() -> Result<()> {
    let json = common::manifest_json(
        "abc123",
        &[
            ("English", "en", None, "https://example.com/tt?lang=en"),
            ("English (auto-generated)", "en", Some("asr"), "https://example.com/tt?lang=en&kind=asr"),
        ],
    );
    let manifest = Manifest::from_json_str(&json)?;

    assert_eq!(manifest.video_id(), Some("abc123"));
    assert_eq!(manifest.title(), Some("Test video"));

    let tracks = manifest.caption_tracks().unwrap();
    assert_eq!(tracks.len(), 2);
    assert!(!tracks[0].is_auto_generated());
    assert!(tracks[1].is_auto_generated());
    assert_eq!(tracks[1].display_name(), "English (auto-generated)");
    Ok(())
}

/// A player response embedded as a string is unwrapped
#[test]
fn test_from_json_str_withEmbeddedPlayerResponse_shouldUnwrap() -> Result<()> {
    let inner = common::manifest_json("xyz", &[("Japanese", "ja", None, "https://example.com/tt?lang=ja")]);
    let wrapped = serde_json::json!({ "playerResponse": inner }).to_string();

    let manifest = Manifest::from_json_str(&wrapped)?;
    assert_eq!(manifest.video_id(), Some("xyz"));
    assert_eq!(manifest.caption_tracks().map(|t| t.len()), Some(1));
    Ok(())
}

#[test]
fn test_display_name_withRunsOrNothing_shouldFallBack() -> Result<()> {
    let json = r#"{
        "captions": { "playerCaptionsTracklistRenderer": { "captionTracks": [
            { "name": { "runs": [ { "text": "Fran" }, { "text": "çais" } ] }, "languageCode": "fr" },
            { "languageCode": "de" }
        ] } }
    }"#;
    let manifest = Manifest::from_json_str(json)?;
    let tracks = manifest.caption_tracks().unwrap();

    assert_eq!(tracks[0].display_name(), "Français");
    assert_eq!(tracks[1].display_name(), "de");
    Ok(())
}

#[test]
fn test_native_sources_withoutCaptionList_shouldFail() -> Result<()> {
    let manifest = Manifest::from_json_str(r#"{ "videoDetails": { "videoId": "v" } }"#)?;
    let result = manifest.native_sources(Arc::new(MockFetcher::new()));

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("No captions available"));
    Ok(())
}

/// Tracks without a language code are skipped, tracks without a URL are kept
#[test]
fn test_native_sources_withIncompleteTracks_shouldSkipOnlyInvalidOnes() -> Result<()> {
    let json = r#"{
        "captions": { "playerCaptionsTracklistRenderer": { "captionTracks": [
            { "name": { "simpleText": "English" }, "languageCode": "en", "baseUrl": "https://example.com/tt?lang=en" },
            { "name": { "simpleText": "Nameless" }, "languageCode": "" },
            { "name": { "simpleText": "Korean" }, "languageCode": "ko" }
        ] } }
    }"#;
    let manifest = Manifest::from_json_str(json)?;
    let sources = manifest.native_sources(Arc::new(MockFetcher::new()))?;

    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].language_code(), "en");
    assert_eq!(sources[0].url(), Some("https://example.com/tt?lang=en"));
    assert_eq!(sources[1].language_code(), "ko");
    assert_eq!(sources[1].url(), None);
    assert!(sources.iter().all(|s| s.state() == SourceState::Genesis));
    Ok(())
}

#[test]
fn test_load_withManifestFile_shouldParse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "manifest.json",
        &common::manifest_json("file1", &[("English", "en", None, "https://example.com/tt")]),
    )?;

    let manifest = Manifest::load(&path)?;
    assert_eq!(manifest.video_id(), Some("file1"));
    Ok(())
}
