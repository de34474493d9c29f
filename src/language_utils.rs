use anyhow::{anyhow, Result};
use isolang::Language;

/// Language utilities for caption language codes
///
/// Caption providers hand out loosely formatted BCP 47 style tags
/// ("en", "en-US", "zh-Hant", "JA"). Matching across the pipeline is a
/// case-insensitive prefix check, so "zh" finds both "zh-Hant" and "zh-Hans".
/// Lowercase and trim a language code for comparison
pub fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

/// True when `candidate` starts with `query`, ignoring case.
///
/// An empty query never matches.
pub fn code_matches_prefix(candidate: &str, query: &str) -> bool {
    let query = normalize_code(query);
    !query.is_empty() && normalize_code(candidate).starts_with(&query)
}

/// Split a tag into its primary language subtag and the remainder
pub fn split_tag(code: &str) -> (&str, Option<&str>) {
    let code = code.trim();
    match code.split_once(['-', '_']) {
        Some((base, rest)) => (base, Some(rest)),
        None => (code, None),
    }
}

/// Validate that the primary subtag is an ISO 639-1 or ISO 639-3 code
pub fn validate_language_code(code: &str) -> Result<Language> {
    let (base, _) = split_tag(code);
    let base = base.to_lowercase();
    let language = match base.len() {
        2 => Language::from_639_1(&base),
        3 => Language::from_639_3(&base),
        _ => None,
    };
    language.ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// English display name for a tag, e.g. "zh-Hant" -> "Chinese (Traditional)"
pub fn display_name(code: &str) -> Result<String> {
    let language = validate_language_code(code)?;
    let name = language.to_name();
    let (_, rest) = split_tag(code);

    let qualifier = rest.map(|subtag| match subtag.to_lowercase().as_str() {
        "hant" | "tw" | "hk" => "Traditional".to_string(),
        "hans" | "cn" | "sg" => "Simplified".to_string(),
        _ => subtag.to_uppercase(),
    });

    Ok(match qualifier {
        Some(qualifier) => format!("{} ({})", name, qualifier),
        None => name.to_string(),
    })
}

/// Like `display_name`, but falls back to the raw tag for unknown codes
pub fn display_name_or_code(code: &str) -> String {
    display_name(code).unwrap_or_else(|_| code.to_string())
}
