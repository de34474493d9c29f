use std::sync::Arc;

use super::source::{CaptionSource, RemoteTranslator};
use crate::errors::ConstructionError;
use crate::language_utils::display_name_or_code;
use crate::providers::Vendor;

/// Every translated track is derived from the native track in this language
pub const PIVOT_LANGUAGE: &str = "en";

/// (language code, tag used for the display name)
type Target = (&'static str, &'static str);

const PLATFORM_TARGETS: &[Target] = &[
    ("zh-Hant", "zh-Hant"),
    ("zh-Hans", "zh-Hans"),
    ("ja", "ja"),
    ("ko", "ko"),
    ("fr", "fr"),
    ("es", "es"),
];

const TENCENT_TARGETS: &[Target] = &[
    ("zh", "zh-Hans"),
    ("ja", "ja"),
    ("ko", "ko"),
    ("fr", "fr"),
    ("es", "es"),
    ("it", "it"),
    ("de", "de"),
    ("ru", "ru"),
];

const DEEPL_TARGETS: &[Target] = &[("zh", "zh-Hans"), ("ja", "ja"), ("es", "es"), ("it", "it")];

/// Who performs a translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translator {
    /// The video platform itself, through the `tlang` URL parameter
    Platform,
    Vendor(Vendor),
}

impl Translator {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Platform => "YouTube",
            Self::Vendor(vendor) => vendor.display_name(),
        }
    }

    fn targets(&self) -> &'static [Target] {
        match self {
            Self::Platform => PLATFORM_TARGETS,
            Self::Vendor(Vendor::Tencent) => TENCENT_TARGETS,
            Self::Vendor(Vendor::DeepL) => DEEPL_TARGETS,
        }
    }

    /// Language codes this translator is offered for
    pub fn target_codes(&self) -> Vec<&'static str> {
        self.targets().iter().map(|(code, _)| *code).collect()
    }
}

/// Track label, e.g. "DeepL | English → Japanese"
pub fn track_name(translator: Translator, from_lang: &str, to_label: &str) -> String {
    format!(
        "{} | {} → {}",
        translator.label(),
        display_name_or_code(from_lang),
        display_name_or_code(to_label)
    )
}

/// Platform translations of `pivot` into every platform target
pub fn platform_batch(pivot: &CaptionSource) -> Vec<Result<CaptionSource, ConstructionError>> {
    PLATFORM_TARGETS
        .iter()
        .map(|(code, label)| {
            let name = track_name(Translator::Platform, PIVOT_LANGUAGE, label);
            CaptionSource::platform_translated(name, *code, pivot)
        })
        .collect()
}

/// Vendor translations of the committed lines of `pivot`
pub fn vendor_batch(
    vendor: Vendor,
    pivot: &CaptionSource,
    translator: Arc<dyn RemoteTranslator>,
) -> Vec<Result<CaptionSource, ConstructionError>> {
    Translator::Vendor(vendor)
        .targets()
        .iter()
        .map(|(code, label)| {
            let name = track_name(Translator::Vendor(vendor), PIVOT_LANGUAGE, label);
            CaptionSource::vendor_translated(name, vendor, code, pivot, translator.clone())
        })
        .collect()
}
