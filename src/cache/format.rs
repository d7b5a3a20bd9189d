//! Line-oriented disk format for content entries
//!
//! ```text
//! TIMESTAMP:<cached_at>
//! LAST_MODIFIED:<last_modified_source>
//! FILE_SIZE:<source_size>
//! CONTENT_HASH:<content_hash>
//! ---CONTENT---
//! <content>
//! ---PROCESSED_HTML---      (only when present)
//! <processed_html>
//! ```
//!
//! Every section ends with a single `\n`. A content line that is exactly
//! `---PROCESSED_HTML---` is indistinguishable from the marker.

use super::types::CacheEntry;
use crate::error::{CacheError, Result};

const TIMESTAMP: &str = "TIMESTAMP:";
const LAST_MODIFIED: &str = "LAST_MODIFIED:";
const FILE_SIZE: &str = "FILE_SIZE:";
const CONTENT_HASH: &str = "CONTENT_HASH:";

pub const CONTENT_MARKER: &str = "---CONTENT---";
pub const HTML_MARKER: &str = "---PROCESSED_HTML---";

/// Serialize an entry into the disk format
pub fn encode(entry: &CacheEntry) -> String {
    let html_len = entry.processed_html.as_ref().map_or(0, |h| h.len() + HTML_MARKER.len() + 2);
    let mut out = String::with_capacity(entry.content.len() + html_len + 128);

    out.push_str(&format!("{TIMESTAMP}{}\n", entry.cached_at));
    out.push_str(&format!("{LAST_MODIFIED}{}\n", entry.last_modified_source));
    out.push_str(&format!("{FILE_SIZE}{}\n", entry.source_size));
    out.push_str(&format!("{CONTENT_HASH}{}\n", entry.content_hash));
    out.push_str(CONTENT_MARKER);
    out.push('\n');
    out.push_str(&entry.content);
    out.push('\n');

    if let Some(html) = &entry.processed_html {
        out.push_str(HTML_MARKER);
        out.push('\n');
        out.push_str(html);
        out.push('\n');
    }

    out
}

/// Parse the disk format back into an entry
pub fn decode(text: &str) -> Result<CacheEntry> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    // The final terminator leaves one empty segment behind
    if text.ends_with('\n') {
        lines.pop();
    }

    let content_start = lines
        .iter()
        .position(|line| *line == CONTENT_MARKER)
        .ok_or_else(|| CacheError::Malformed("missing content marker".to_string()))?;

    let header = &lines[..content_start];
    let body = &lines[content_start + 1..];

    let (content, processed_html) = match body.iter().position(|line| *line == HTML_MARKER) {
        Some(html_start) => (
            body[..html_start].join("\n"),
            Some(body[html_start + 1..].join("\n")),
        ),
        None => (body.join("\n"), None),
    };

    Ok(CacheEntry {
        content,
        processed_html,
        cached_at: header_number(header, TIMESTAMP)?,
        last_modified_source: header_number(header, LAST_MODIFIED)?,
        source_size: header_number(header, FILE_SIZE)?,
        content_hash: header_value(header, CONTENT_HASH)?.to_string(),
    })
}

fn header_value<'a>(header: &[&'a str], prefix: &str) -> Result<&'a str> {
    header
        .iter()
        .find_map(|line| line.strip_prefix(prefix))
        .map(str::trim)
        .ok_or_else(|| CacheError::Malformed(format!("missing header {}", prefix)))
}

fn header_number<T: std::str::FromStr>(header: &[&str], prefix: &str) -> Result<T> {
    let value = header_value(header, prefix)?;
    value
        .parse()
        .map_err(|_| CacheError::Malformed(format!("invalid {} {:?}", prefix, value)))
}
