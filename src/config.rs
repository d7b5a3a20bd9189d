//! Configuration management for the document cache

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Maximum content size accepted by the cache: 5 MiB
pub const MAX_CONTENT_BYTES: usize = 5 * 1024 * 1024;

/// Content entry time-to-live: 24 hours
pub const CONTENT_TTL_HOURS: u64 = 24;

/// Number of characters kept in a metadata preview
pub const PREVIEW_CHARS: usize = 200;

/// Cache configuration options
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding the disk tier files
    pub cache_dir: PathBuf,
    /// Maximum number of content entries kept in memory
    pub max_content_entries: usize,
    /// Maximum number of file metadata entries kept in memory
    pub max_metadata_entries: usize,
    /// Maximum number of outlines kept in memory
    pub max_outline_entries: usize,
    /// Content larger than this (UTF-8 bytes) is never cached
    pub max_content_bytes: usize,
    /// Age after which a content entry is expired
    pub ttl: Duration,
    /// Characters kept in a metadata preview
    pub preview_chars: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: env::temp_dir().join("docview-cache"),
            max_content_entries: 20,
            max_metadata_entries: 100,
            max_outline_entries: 50,
            max_content_bytes: MAX_CONTENT_BYTES,
            ttl: Duration::from_secs(CONTENT_TTL_HOURS * 60 * 60),
            preview_chars: PREVIEW_CHARS,
        }
    }
}

impl CacheConfig {
    /// Default configuration rooted at the given cache directory
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from `DOCVIEW_CACHE_*` environment variables.
    ///
    /// Unset variables keep their defaults; set but unparsable values are
    /// reported as [`ConfigError::InvalidValue`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            cache_dir: env::var("DOCVIEW_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            max_content_entries: parse_var("DOCVIEW_CACHE_MAX_CONTENT")?
                .unwrap_or(defaults.max_content_entries),
            max_metadata_entries: parse_var("DOCVIEW_CACHE_MAX_METADATA")?
                .unwrap_or(defaults.max_metadata_entries),
            max_outline_entries: parse_var("DOCVIEW_CACHE_MAX_OUTLINE")?
                .unwrap_or(defaults.max_outline_entries),
            max_content_bytes: parse_var("DOCVIEW_CACHE_MAX_CONTENT_BYTES")?
                .unwrap_or(defaults.max_content_bytes),
            ttl: match parse_var::<u64>("DOCVIEW_CACHE_TTL_HOURS")? {
                Some(hours) => ttl_from_hours("DOCVIEW_CACHE_TTL_HOURS", hours)?,
                None => defaults.ttl,
            },
            preview_chars: defaults.preview_chars,
        })
    }
}

/// Convert a TTL in hours, rejecting values whose seconds overflow `u64`
fn ttl_from_hours(key: &'static str, hours: u64) -> Result<Duration, ConfigError> {
    hours
        .checked_mul(60 * 60)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::InvalidValue {
            key,
            value: hours.to_string(),
        })
}

/// Parse an optional environment variable
pub fn parse_var<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(None),
    }
}
