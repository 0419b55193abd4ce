use std::sync::OnceLock;

use regex::Regex;

use crate::errors::ExtractionError;

static SVG_SPAN: OnceLock<Regex> = OnceLock::new();

/// Isolate the first `<svg>...</svg>` span from a model response.
///
/// Non-greedy from the first `<svg` to the first following `</svg>`,
/// case-sensitive, across embedded newlines. The span is returned verbatim,
/// inner whitespace included. Model responses usually wrap the markup in
/// prose or code fences; everything outside the span is discarded.
pub fn extract_svg(response: &str) -> Result<&str, ExtractionError> {
    let re = SVG_SPAN.get_or_init(|| {
        Regex::new(r"(?s)<svg.*?</svg>").expect("svg span pattern")
    });
    re.find(response)
        .map(|m| m.as_str())
        .ok_or(ExtractionError::NoSvg)
}
