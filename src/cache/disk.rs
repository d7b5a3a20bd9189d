//! Disk tier: flat-file shadow copies of content entries
//!
//! Each entry lives in `cache_<hash(path)>.txt` inside the cache directory.
//! The path to filename registry is in-process only, so after a restart it
//! starts empty and lookups fall back to recomputing the hash.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use sha2::{Digest, Sha256};

use super::format;
use super::types::CacheEntry;
use crate::error::Result;

/// Number of digest bytes kept; 16 bytes = 32 hex chars
const HASH_BYTES: usize = 16;

/// File count and total size of the cache directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskUsage {
    pub files: usize,
    pub bytes: u64,
}

/// Outcome of [`DiskTier::clear`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearSummary {
    pub removed: usize,
    /// Entries that could not be inspected or removed
    pub failed: usize,
}

/// Flat-file persistence for content entries
pub struct DiskTier {
    cache_dir: PathBuf,
    /// Original path -> file name inside `cache_dir`
    registry: RwLock<HashMap<String, String>>,
}

impl DiskTier {
    /// Create a disk tier rooted at `cache_dir`.
    ///
    /// The directory is created if possible; failure is only logged since
    /// every write recreates it on demand.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        if let Err(e) = std::fs::create_dir_all(&cache_dir) {
            tracing::warn!(dir = %cache_dir.display(), error = %e, "Failed to create cache directory");
        }

        Self {
            cache_dir,
            registry: RwLock::new(HashMap::new()),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// File name used for a source path
    pub fn file_name_for(path: &str) -> String {
        format!("cache_{}.txt", compute_hash(path.as_bytes()))
    }

    /// Location of the cache file for a source path
    pub fn file_path(&self, path: &str) -> PathBuf {
        let name = self
            .registry
            .read()
            .get(path)
            .cloned()
            .unwrap_or_else(|| Self::file_name_for(path));
        self.cache_dir.join(name)
    }

    /// Registry file name for a path, if a write has completed for it
    pub fn registered(&self, path: &str) -> Option<String> {
        self.registry.read().get(path).cloned()
    }

    pub fn registry_len(&self) -> usize {
        self.registry.read().len()
    }

    /// Forget every path to filename mapping
    pub fn reset_registry(&self) {
        self.registry.write().clear();
    }

    /// Write an entry to disk and register its file name
    pub async fn write(&self, path: &str, entry: &CacheEntry) -> Result<()> {
        let name = Self::file_name_for(path);
        let target = self.cache_dir.join(&name);

        tokio::fs::create_dir_all(&self.cache_dir).await?;
        tokio::fs::write(&target, format::encode(entry)).await?;

        self.registry.write().insert(path.to_string(), name);

        tracing::debug!(path = %path, file = %target.display(), "Wrote cache file");
        Ok(())
    }

    /// Read an entry back from disk.
    ///
    /// Returns `Ok(None)` when no file exists and `CacheError::Malformed`
    /// when one exists but cannot be parsed.
    pub async fn read(&self, path: &str) -> Result<Option<CacheEntry>> {
        let file = self.file_path(path);

        let text = match tokio::fs::read(&file).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        format::decode(&text).map(Some)
    }

    /// Delete the cache file for a path. A missing file is not an error.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let file = self.file_path(path);
        self.registry.write().remove(path);

        match tokio::fs::remove_file(&file).await {
            Ok(()) => {
                tracing::debug!(path = %path, file = %file.display(), "Deleted cache file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every file in the cache directory and reset the registry.
    ///
    /// A file that cannot be removed is logged and counted, and the sweep
    /// moves on to the next one. Subdirectories are left alone.
    pub async fn clear(&self) -> Result<ClearSummary> {
        self.reset_registry();

        let mut entries = match tokio::fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ClearSummary::default()),
            Err(e) => return Err(e.into()),
        };

        let mut summary = ClearSummary::default();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(dir = %self.cache_dir.display(), error = %e, "Failed to list cache directory");
                    summary.failed += 1;
                    break;
                }
            };
            let file = entry.path();

            match entry.file_type().await {
                Ok(file_type) if !file_type.is_file() => continue,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(file = %file.display(), error = %e, "Failed to stat cache file");
                    summary.failed += 1;
                    continue;
                }
            }

            match tokio::fs::remove_file(&file).await {
                Ok(()) => summary.removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(file = %file.display(), error = %e, "Failed to delete cache file");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Scan the cache directory for its file count and total size
    pub async fn usage(&self) -> Result<DiskUsage> {
        let mut entries = match tokio::fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(DiskUsage::default()),
            Err(e) => return Err(e.into()),
        };

        let mut usage = DiskUsage::default();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                // Removed between listing and stat
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if metadata.is_file() {
                usage.files += 1;
                usage.bytes += metadata.len();
            }
        }

        Ok(usage)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Deterministic 32 hex char digest (truncated SHA-256)
pub fn compute_hash(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    hex::encode(&digest[..HASH_BYTES])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use tempfile::TempDir;

    fn entry(content: &str) -> CacheEntry {
        CacheEntry {
            content: content.to_string(),
            processed_html: Some("<p>html</p>".to_string()),
            last_modified_source: 42,
            source_size: content.len() as u64,
            content_hash: compute_hash(content.as_bytes()),
            cached_at: 7,
        }
    }

    #[test]
    fn test_compute_hash() {
        let hash = compute_hash(b"Hello, World!");
        assert_eq!(hash.len(), 32);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(hash, compute_hash(b"Hello, World!"));
        assert_ne!(hash, compute_hash(b"Hello, World?"));
    }

    #[test]
    fn test_file_name_for() {
        let name = DiskTier::file_name_for("/docs/a.md");
        assert!(name.starts_with("cache_"));
        assert!(name.ends_with(".txt"));
        assert_eq!(name.len(), "cache_".len() + 32 + ".txt".len());
    }

    #[tokio::test]
    async fn test_write_read_delete() {
        let temp_dir = TempDir::new().unwrap();
        let disk = DiskTier::new(temp_dir.path());
        let original = entry("line one\nline two");

        disk.write("/a.md", &original).await.unwrap();
        assert_eq!(disk.registered("/a.md"), Some(DiskTier::file_name_for("/a.md")));
        assert!(disk.file_path("/a.md").exists());

        let read = disk.read("/a.md").await.unwrap().unwrap();
        assert_eq!(read, original);

        disk.delete("/a.md").await.unwrap();
        assert!(!disk.file_path("/a.md").exists());
        assert_eq!(disk.registered("/a.md"), None);

        // Deleting again is a no-op
        disk.delete("/a.md").await.unwrap();
        assert!(disk.read("/a.md").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_falls_back_to_hash_after_restart() {
        let temp_dir = TempDir::new().unwrap();
        let original = entry("persisted");
        {
            let disk = DiskTier::new(temp_dir.path());
            disk.write("/b.md", &original).await.unwrap();
        }

        let disk = DiskTier::new(temp_dir.path());
        assert_eq!(disk.registry_len(), 0);
        assert_eq!(disk.read("/b.md").await.unwrap(), Some(original));
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let disk = DiskTier::new(temp_dir.path());
        std::fs::write(disk.file_path("/c.md"), "TIMESTAMP:1\nLAST").unwrap();

        assert!(matches!(disk.read("/c.md").await, Err(CacheError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_write_recreates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let cache_dir = temp_dir.path().join("nested").join("cache");
        let disk = DiskTier::new(&cache_dir);
        std::fs::remove_dir_all(&cache_dir).unwrap();

        disk.write("/d.md", &entry("d")).await.unwrap();
        assert!(cache_dir.join(DiskTier::file_name_for("/d.md")).exists());
    }

    #[tokio::test]
    async fn test_clear_and_usage() {
        let temp_dir = TempDir::new().unwrap();
        let disk = DiskTier::new(temp_dir.path());

        disk.write("/a.md", &entry("aaaa")).await.unwrap();
        disk.write("/b.md", &entry("bb")).await.unwrap();
        std::fs::write(temp_dir.path().join("stray.bin"), [0u8; 10]).unwrap();

        let expected_bytes: u64 = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().metadata().unwrap().len())
            .sum();

        let usage = disk.usage().await.unwrap();
        assert_eq!(usage.files, 3);
        assert_eq!(usage.bytes, expected_bytes);

        assert_eq!(
            disk.clear().await.unwrap(),
            ClearSummary { removed: 3, failed: 0 }
        );
        assert_eq!(disk.registry_len(), 0);
        assert_eq!(disk.usage().await.unwrap(), DiskUsage::default());
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let cache_dir = temp_dir.path().join("gone");
        let disk = DiskTier::new(&cache_dir);
        std::fs::remove_dir(&cache_dir).unwrap();

        assert_eq!(disk.usage().await.unwrap(), DiskUsage::default());
        assert_eq!(disk.clear().await.unwrap(), ClearSummary::default());
        assert!(disk.read("/x.md").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_skips_subdirectories_and_continues() {
        let temp_dir = TempDir::new().unwrap();
        let disk = DiskTier::new(temp_dir.path());

        disk.write("/a.md", &entry("a")).await.unwrap();
        let nested = temp_dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("keep.txt"), "keep").unwrap();
        disk.write("/b.md", &entry("b")).await.unwrap();

        let summary = disk.clear().await.unwrap();
        assert_eq!(summary, ClearSummary { removed: 2, failed: 0 });
        assert!(nested.join("keep.txt").exists());
        assert!(disk.read("/a.md").await.unwrap().is_none());
        assert!(disk.read("/b.md").await.unwrap().is_none());
    }
}
