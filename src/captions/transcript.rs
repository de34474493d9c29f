/*!
 * Timed-text transcript parsing.
 *
 * Native tracks are served as `<transcript><text start=".." dur="..">..</text></transcript>`.
 * Auto-generated tracks carry short, overlapping fragments that are merged
 * pairwise into readable lines.
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::CaptionLine;
use crate::errors::CaptionError;

static CHAR_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#(?:(\d+)|[xX]([0-9a-fA-F]+));").unwrap());

/// One `<text>` element of a transcript
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

impl Fragment {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Parse a transcript document into lines.
///
/// Auto-generated transcripts are coalesced two fragments per line.
pub fn parse_transcript(xml: &str, is_auto_generated: bool) -> Result<Vec<CaptionLine>, CaptionError> {
    let fragments = parse_fragments(xml)?;
    Ok(if is_auto_generated {
        coalesce_fragments(&fragments)
    } else {
        fragments
            .into_iter()
            .enumerate()
            .map(|(id, fragment)| {
                let end = fragment.end();
                CaptionLine::new(id, fragment.start, end, fragment.text)
            })
            .collect()
    })
}

/// Extract every `transcript > text` element, in document order
pub fn parse_fragments(xml: &str) -> Result<Vec<Fragment>, CaptionError> {
    let document = roxmltree::Document::parse(xml)
        .map_err(|e| CaptionError::Parse(format!("invalid transcript XML: {}", e)))?;

    let mut fragments = Vec::new();
    for transcript in document
        .descendants()
        .filter(|node| node.has_tag_name("transcript"))
    {
        for node in transcript.children().filter(|node| node.has_tag_name("text")) {
            let start = parse_seconds(node.attribute("start"), "start")?;
            let duration = match node.attribute("dur") {
                Some(_) => parse_seconds(node.attribute("dur"), "dur")?,
                None => 0.0,
            };
            let raw: String = node
                .descendants()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .collect();
            fragments.push(Fragment {
                start,
                duration,
                text: decode_char_refs(&raw),
            });
        }
    }

    Ok(fragments)
}

fn parse_seconds(value: Option<&str>, attribute: &str) -> Result<f64, CaptionError> {
    let value = value.ok_or_else(|| CaptionError::Parse(format!("<text> without '{}'", attribute)))?;
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
        .ok_or_else(|| CaptionError::Parse(format!("invalid '{}' value: {}", attribute, value)))
}

/// Merge each consecutive pair of fragments into one line.
///
/// Line `i / 2` starts with fragment `i` and ends with whichever of the two
/// fragments ends later; a trailing unpaired fragment stands alone.
pub fn coalesce_fragments(fragments: &[Fragment]) -> Vec<CaptionLine> {
    fragments
        .chunks(2)
        .enumerate()
        .filter_map(|(id, pair)| {
            let first = pair.first()?;
            Some(match pair.get(1) {
                Some(second) => CaptionLine::new(
                    id,
                    first.start,
                    first.end().max(second.end()),
                    format!("{} {}", first.text, second.text),
                ),
                None => CaptionLine::new(id, first.start, first.end(), first.text.clone()),
            })
        })
        .collect()
}

/// Decode decimal (`&#39;`) and hexadecimal (`&#x27;`) numeric character references
pub fn decode_char_refs(text: &str) -> String {
    CHAR_REF
        .replace_all(text, |caps: &Captures| {
            let code = match (caps.get(1), caps.get(2)) {
                (Some(dec), _) => dec.as_str().parse::<u32>().ok(),
                (_, Some(hex)) => u32::from_str_radix(hex.as_str(), 16).ok(),
                _ => None,
            };
            code.and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
