//! Fenced code block extraction
//!
//! Generation responses wrap the component source in a triple-backtick
//! block, with or without a language tag. Only the first block is used.

use livecoder_common::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[a-zA-Z]*\n([\s\S]*?)```").expect("fence regex"));

/// Extract the first fenced code block, trimmed of surrounding whitespace.
///
/// Returns `Error::Extraction` when the response contains no block, or only
/// an empty one.
pub fn first_code_block(response: &str) -> Result<String> {
    let source = FENCE_RE
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .ok_or(Error::Extraction)?;

    if source.is_empty() {
        return Err(Error::Extraction);
    }

    Ok(source)
}
