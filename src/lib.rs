//! Docview Cache Library
//!
//! Two-tier (memory + disk) cache for parsed document content, file
//! metadata and derived outlines. The binary in main.rs is a small
//! composition root around [`DocumentCache`].
//!
//! # Modules
//!
//! - `cache`: Memory and disk tiers, coordinator, maintenance
//! - `config`: Cache configuration and environment loading
//! - `error`: Error types used at the disk tier boundary

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{
    CacheEntry, CacheStats, DocumentCache, FileMetadataEntry, HeadingItem, OutlineEntry,
};
pub use config::CacheConfig;
pub use error::{CacheError, ConfigError};
