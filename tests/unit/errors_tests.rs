/*!
 * Tests for error types and conversions
 */

use bicap::errors::{AppError, BridgeError, CaptionError, ProviderError, SchedulerError};
use bicap::providers::Vendor;

#[test]
fn test_providerError_apiError_shouldDisplayStatusAndMessage() {
    let error = ProviderError::ApiError {
        status_code: 456,
        message: "Quota exceeded".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("456"));
    assert!(display.contains("Quota exceeded"));
}

#[test]
fn test_providerError_vendorError_shouldDisplayCodeAndMessage() {
    let error = ProviderError::VendorError {
        code: "AuthFailure.SignatureFailure".to_string(),
        message: "signature mismatch".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("Vendor reported error"));
    assert!(display.contains("AuthFailure.SignatureFailure"));
}

#[test]
fn test_providerError_fromSchedulerError_shouldWrap() {
    let error: ProviderError = SchedulerError::TaskDropped.into();
    assert!(matches!(error, ProviderError::Scheduler(SchedulerError::TaskDropped)));
    assert!(format!("{}", error).contains("Scheduler error"));
}

/// Capability and remote failures keep their meaning on the caption side
#[test]
fn test_captionError_fromBridgeError_shouldMapVariants() {
    assert_eq!(
        CaptionError::from(BridgeError::CapabilityDisabled(Vendor::DeepL)),
        CaptionError::CapabilityDisabled(Vendor::DeepL)
    );
    assert_eq!(
        CaptionError::from(BridgeError::Remote("TRANSLATION_FAILED: boom".to_string())),
        CaptionError::Vendor("TRANSLATION_FAILED: boom".to_string())
    );
    assert!(matches!(
        CaptionError::from(BridgeError::Disconnected),
        CaptionError::Bridge(_)
    ));
}

#[test]
fn test_bridgeError_capabilityDisabled_shouldNameVendor() {
    let display = format!("{}", BridgeError::CapabilityDisabled(Vendor::Tencent));
    assert_eq!(display, "Tencent translation is not enabled");
}

#[test]
fn test_appError_fromProviderError_shouldWrapCorrectly() {
    let provider_error = ProviderError::RequestFailed("Network down".to_string());
    let app_error: AppError = provider_error.into();
    let display = format!("{}", app_error);
    assert!(display.contains("Provider error"));
    assert!(display.contains("Network down"));
}

#[test]
fn test_appError_fromIoError_shouldWrapAsFileError() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
    let app_error: AppError = io_error.into();
    let display = format!("{}", app_error);
    assert!(display.contains("File error"));
    assert!(display.contains("File not found"));
}

#[test]
fn test_appError_fromAnyhowError_shouldWrapAsUnknown() {
    let anyhow_error = anyhow::anyhow!("Something went wrong");
    let app_error: AppError = anyhow_error.into();
    let display = format!("{}", app_error);
    assert!(display.contains("Unknown error"));
    assert!(display.contains("Something went wrong"));
}

#[test]
fn test_appError_fromCaptionAndBridgeErrors_shouldWrap() {
    let caption: AppError = CaptionError::MissingUrl("English".to_string()).into();
    assert!(format!("{}", caption).contains("URL unavailable for English"));

    let bridge: AppError = BridgeError::Disconnected.into();
    assert!(format!("{:?}", bridge).contains("Bridge"));
}
