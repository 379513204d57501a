//! Input resolution: normalise a user-supplied page reference to a Notion id.
//!
//! Users paste whatever they have at hand: the page URL from the browser
//! (`https://www.notion.so/workspace/My-Page-0123…cdef`), a share link with a
//! `?p=` parameter, a dashed UUID from the API, or the bare 32-character id.
//! All of them resolve to the dashed, lowercase UUID form the API expects.

use crate::error::ImportError;
use reqwest::Url;
use tracing::debug;

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a URL, dashed UUID or 32-hex id to a dashed UUID.
pub fn resolve_document_id(input: &str) -> Result<String, ImportError> {
    let trimmed = input.trim();
    let invalid = || ImportError::InvalidInput {
        input: input.to_string(),
    };

    let hex = if is_url(trimmed) {
        id_from_url(trimmed).ok_or_else(invalid)?
    } else {
        let compact = trimmed.replace('-', "");
        if !is_hex_id(&compact) {
            return Err(invalid());
        }
        compact
    };

    let id = dashed(&hex.to_ascii_lowercase());
    debug!("Resolved '{}' to page id {}", input, id);
    Ok(id)
}

fn id_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;

    // Share links of pages opened inside a database view.
    if let Some((_, p)) = parsed.query_pairs().find(|(k, _)| k == "p") {
        let compact = p.replace('-', "");
        if is_hex_id(&compact) {
            return Some(compact);
        }
    }

    let segment = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()?;
    let compact = segment.replace('-', "");
    let tail = compact.get(compact.len().checked_sub(32)?..)?;
    is_hex_id(tail).then(|| tail.to_string())
}

fn is_hex_id(s: &str) -> bool {
    s.len() == 32 && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn dashed(hex: &str) -> String {
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
