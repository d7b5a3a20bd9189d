//! Two-tier document cache
//!
//! Caches decoded document content, directory-listing metadata and heading
//! outlines so viewers can skip re-reading and re-parsing unchanged files.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    DocumentCache                        │
//! │   (lookup, insert, validity, preload, clear, stats)     │
//! └─────────────────────────────────────────────────────────┘
//!              │ sync                        │ spawned
//!              ▼                             ▼
//!   ┌─────────────────────────┐   ┌─────────────────────────┐
//!   │       MemoryTier        │   │        DiskTier         │
//!   │ content    LRU (20)     │   │ cache_<hash>.txt files  │
//!   │ metadata   LRU (100)    │   │ path -> file registry   │
//!   │ outline    LRU (50)     │   │ (content entries only)  │
//!   └─────────────────────────┘   └─────────────────────────┘
//! ```
//!
//! Memory is the source of truth. The disk tier is a write-behind shadow
//! that normal lookups never read.
//!
//! # Usage
//!
//! ```rust,ignore
//! use docview_cache::{CacheConfig, DocumentCache};
//!
//! let cache = DocumentCache::new(CacheConfig::from_env()?);
//!
//! if !cache.is_cache_valid(path, mtime, size) {
//!     let text = render(path)?;
//!     cache.cache_content(path, text, None, mtime, size);
//! }
//! let entry = cache.get_cached_content(path);
//! ```

mod clock;
mod coordinator;
mod disk;
pub mod format;
mod maintenance;
mod memory;
mod source;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinator::DocumentCache;
pub use disk::{compute_hash, ClearSummary, DiskTier, DiskUsage};
pub use maintenance::DEFAULT_CLEANUP_INTERVAL;
pub use memory::{BoundedCache, MemoryTier};
pub use source::{LocalFiles, SourceFiles, SourceStat};
pub use types::{CacheEntry, CacheStats, FileMetadataEntry, HeadingItem, OutlineEntry};
