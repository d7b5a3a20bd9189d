//! Cached value types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One cached document body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Full decoded text
    pub content: String,

    /// Optional pre-rendered HTML
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_html: Option<String>,

    /// Source modification time (ms since epoch) when cached
    pub last_modified_source: i64,

    /// Source size in bytes when cached
    pub source_size: u64,

    /// 32 hex char digest of `content`
    pub content_hash: String,

    /// Insertion time (ms since epoch)
    pub cached_at: i64,
}

impl CacheEntry {
    /// Age of the entry in milliseconds at `now`
    pub fn age_millis(&self, now: i64) -> i64 {
        now.saturating_sub(self.cached_at)
    }

    /// Whether the entry was cached from a source with this mtime and size
    pub fn matches_source(&self, last_modified: i64, size: u64) -> bool {
        self.last_modified_source == last_modified && self.source_size == size
    }
}

/// Lightweight directory-listing record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadataEntry {
    pub path: String,
    pub name: String,
    pub size: u64,
    pub last_modified: i64,
    pub is_markdown: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_preview: Option<String>,
}

/// A single heading in a document outline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingItem {
    /// Heading level, 1 through 6
    pub level: u8,
    /// Heading text
    pub text: String,
    /// Position of the heading in the document
    pub position: usize,
}

impl HeadingItem {
    pub const MIN_LEVEL: u8 = 1;
    pub const MAX_LEVEL: u8 = 6;
}

/// Extracted outline of a document
pub type OutlineEntry = Vec<HeadingItem>;

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of content entries in memory
    pub content_entries: usize,
    /// Content cache capacity
    pub content_capacity: usize,
    /// Number of file metadata entries in memory
    pub metadata_entries: usize,
    /// Metadata cache capacity
    pub metadata_capacity: usize,
    /// Number of outlines in memory
    pub outline_entries: usize,
    /// Outline cache capacity
    pub outline_capacity: usize,
    /// Number of files in the cache directory
    pub disk_files: usize,
    /// Total size of the cache directory in bytes
    pub disk_bytes: u64,
}

impl CacheStats {
    /// Flatten the statistics into a key/value map
    pub fn to_map(&self) -> BTreeMap<String, u64> {
        [
            ("content_entries", self.content_entries as u64),
            ("content_capacity", self.content_capacity as u64),
            ("metadata_entries", self.metadata_entries as u64),
            ("metadata_capacity", self.metadata_capacity as u64),
            ("outline_entries", self.outline_entries as u64),
            ("outline_capacity", self.outline_capacity as u64),
            ("disk_files", self.disk_files as u64),
            ("disk_bytes", self.disk_bytes),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
    }
}
