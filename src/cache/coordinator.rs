//! Document cache coordinator
//!
//! Composes the memory and disk tiers behind an infallible API. Memory
//! operations complete before the call returns; disk writes and deletes
//! are queued to a single background worker and never awaited by the
//! caller.
//!
//! # Consistency
//!
//! The disk tier is a write-behind shadow. Disk operations are enqueued
//! while the memory change they shadow is still serialized against other
//! disk-bound changes, so the worker applies them in memory order and a
//! path's shadow always converges to its latest memory state.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Notify};

use super::clock::{Clock, SystemClock};
use super::disk::{compute_hash, DiskTier};
use super::memory::MemoryTier;
use super::source::{self, LocalFiles, SourceFiles};
use super::types::{CacheEntry, CacheStats, FileMetadataEntry, HeadingItem, OutlineEntry};
use crate::config::CacheConfig;

/// Two-tier cache for document content, file metadata and outlines
#[derive(Clone)]
pub struct DocumentCache {
    pub(crate) inner: Arc<DocumentCacheInner>,
}

pub(crate) struct DocumentCacheInner {
    pub(crate) config: CacheConfig,
    pub(crate) memory: MemoryTier,
    pub(crate) disk: Arc<DiskTier>,
    pub(crate) clock: Arc<dyn Clock>,
    source: Arc<dyn SourceFiles>,
    pub(crate) runtime: Handle,
    pending: Arc<PendingTasks>,
    /// Held while mutating memory and enqueueing the matching disk job
    disk_queue: Mutex<mpsc::UnboundedSender<DiskJob>>,
}

/// Disk operation applied by the worker
enum DiskOp {
    Write { path: String, entry: CacheEntry },
    Delete(String),
    Clear,
}

struct DiskJob {
    op: DiskOp,
    _guard: PendingGuard,
}

/// In-flight background task counter
#[derive(Default)]
struct PendingTasks {
    count: AtomicUsize,
    idle: Notify,
}

/// Decrements the pending count when a background task ends, even on panic
struct PendingGuard(Arc<PendingTasks>);

impl PendingGuard {
    fn new(pending: &Arc<PendingTasks>) -> Self {
        pending.count.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(pending))
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

impl DocumentCache {
    /// Create a cache using the current Tokio runtime, the system clock and
    /// the local filesystem.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime. Use
    /// [`DocumentCache::with_handle`] to pass a runtime explicitly.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_handle(config, Handle::current())
    }

    /// Create a cache that spawns background disk work on `runtime`
    pub fn with_handle(config: CacheConfig, runtime: Handle) -> Self {
        Self::with_parts(config, Arc::new(SystemClock), Arc::new(LocalFiles), runtime)
    }

    /// Create a cache on the current runtime with a custom clock
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_parts(config, clock, Arc::new(LocalFiles), Handle::current())
    }

    /// Create a cache from explicit collaborators
    pub fn with_parts(
        config: CacheConfig,
        clock: Arc<dyn Clock>,
        source: Arc<dyn SourceFiles>,
        runtime: Handle,
    ) -> Self {
        let disk = Arc::new(DiskTier::new(config.cache_dir.clone()));
        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
        runtime.spawn(run_disk_worker(Arc::clone(&disk), jobs_rx));

        Self {
            inner: Arc::new(DocumentCacheInner {
                memory: MemoryTier::new(&config),
                disk,
                config,
                clock,
                source,
                runtime,
                pending: Arc::new(PendingTasks::default()),
                disk_queue: Mutex::new(jobs_tx),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    pub fn cache_dir(&self) -> &Path {
        self.inner.disk.cache_dir()
    }

    /// Location of the disk shadow for a source path
    pub fn disk_file_path(&self, path: &str) -> PathBuf {
        self.inner.disk.file_path(path)
    }

    // ========================================================================
    // Content
    // ========================================================================

    /// Look up cached content. Memory tier only.
    pub fn get_cached_content(&self, path: &str) -> Option<CacheEntry> {
        let entry = self.inner.memory.content.get(path);
        tracing::trace!(path = %path, hit = entry.is_some(), "Content lookup");
        entry
    }

    /// Cache document content.
    ///
    /// Content over `max_content_bytes` is ignored and `false` is returned.
    /// Otherwise the entry is stored in memory and a disk write is scheduled.
    pub fn cache_content(
        &self,
        path: &str,
        content: impl Into<String>,
        processed_html: Option<String>,
        last_modified_source: i64,
        source_size: u64,
    ) -> bool {
        let content = content.into();
        let max = self.inner.config.max_content_bytes;
        if content.len() > max {
            tracing::debug!(
                path = %path,
                size = content.len(),
                max = max,
                "Content exceeds cache size limit, not caching"
            );
            return false;
        }

        let entry = CacheEntry {
            content_hash: compute_hash(content.as_bytes()),
            content,
            processed_html,
            last_modified_source,
            source_size,
            cached_at: self.inner.clock.now_millis(),
        };

        let queue = self.inner.disk_queue.lock();
        self.inner.memory.content.put(path.to_string(), entry.clone());
        self.enqueue_disk(&queue, DiskOp::Write { path: path.to_string(), entry });
        true
    }

    /// Whether a cached entry matches the source and has not expired
    pub fn is_cache_valid(&self, path: &str, current_last_modified: i64, current_size: u64) -> bool {
        match self.inner.memory.content.peek(path) {
            Some(entry) => {
                entry.matches_source(current_last_modified, current_size) && !self.is_expired(&entry)
            }
            None => false,
        }
    }

    /// Read an entry directly from the disk tier.
    ///
    /// Missing, unreadable and malformed files all yield `None`.
    pub async fn read_from_disk(&self, path: &str) -> Option<CacheEntry> {
        match self.inner.disk.read(path).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "Ignoring unreadable cache file");
                None
            }
        }
    }

    /// Drop every cached value for a path and schedule deletion of its
    /// disk shadow
    pub fn invalidate(&self, path: &str) {
        let queue = self.inner.disk_queue.lock();
        self.inner.memory.content.remove(path);
        self.inner.memory.metadata.remove(path);
        self.inner.memory.outline.remove(path);
        self.enqueue_disk(&queue, DiskOp::Delete(path.to_string()));
    }

    // ========================================================================
    // Metadata and outlines
    // ========================================================================

    pub fn cache_file_metadata(&self, path: &str, metadata: FileMetadataEntry) {
        self.inner.memory.metadata.put(path.to_string(), metadata);
    }

    pub fn get_cached_file_metadata(&self, path: &str) -> Option<FileMetadataEntry> {
        self.inner.memory.metadata.get(path)
    }

    /// Cache a document outline. Heading levels are clamped to 1..=6.
    pub fn cache_outline(&self, path: &str, mut outline: OutlineEntry) {
        for heading in outline.iter_mut() {
            let level = heading.level.clamp(HeadingItem::MIN_LEVEL, HeadingItem::MAX_LEVEL);
            if level != heading.level {
                tracing::debug!(path = %path, level = heading.level, "Clamping heading level");
                heading.level = level;
            }
        }
        self.inner.memory.outline.put(path.to_string(), outline);
    }

    pub fn get_cached_outline(&self, path: &str) -> Option<OutlineEntry> {
        self.inner.memory.outline.get(path)
    }

    // ========================================================================
    // Preload
    // ========================================================================

    /// Load and cache source files in the background.
    ///
    /// Paths already cached are skipped, as are files over the size limit
    /// and files that fail to stat or read. Each path is loaded by its own
    /// task, so completion order is unspecified. Returns the number of
    /// paths scheduled.
    pub fn preload_content<I, P>(&self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let mut scheduled = 0;
        for path in paths {
            let path = path.into();
            if self.inner.memory.content.contains(&path) {
                continue;
            }

            let cache = self.clone();
            self.spawn_background(async move { cache.preload_one(&path).await });
            scheduled += 1;
        }
        scheduled
    }

    async fn preload_one(&self, path: &str) {
        let source = Arc::clone(&self.inner.source);
        let max = self.inner.config.max_content_bytes;

        let stat = match source.stat(path).await {
            Ok(stat) => stat,
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "Skipping preload, stat failed");
                return;
            }
        };
        if stat.size > max as u64 {
            tracing::debug!(path = %path, size = stat.size, "Skipping preload, file too large");
            return;
        }

        let bytes = match source.read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "Skipping preload, read failed");
                return;
            }
        };
        let content = String::from_utf8_lossy(&bytes).into_owned();
        let preview = source::preview(&content, self.inner.config.preview_chars);

        if !self.cache_content(path, content, None, stat.last_modified, stat.size) {
            return;
        }

        self.cache_file_metadata(
            path,
            FileMetadataEntry {
                path: path.to_string(),
                name: source::file_name(path),
                size: stat.size,
                last_modified: stat.last_modified,
                is_markdown: source::is_markdown(path),
                content_preview: Some(preview),
            },
        );

        tracing::debug!(path = %path, size = stat.size, "Preloaded content");
    }

    // ========================================================================
    // Clearing and statistics
    // ========================================================================

    /// Evict all memory caches. The disk tier is untouched.
    pub fn clear_memory_cache(&self) {
        self.inner.memory.evict_all();
        tracing::debug!("Cleared memory cache");
    }

    /// Evict all memory caches and delete every disk cache file
    pub fn clear_all_cache(&self) {
        let queue = self.inner.disk_queue.lock();
        self.inner.memory.evict_all();
        self.enqueue_disk(&queue, DiskOp::Clear);
    }

    /// Get cache statistics. Disk figures come from a directory scan.
    pub async fn get_cache_stats(&self) -> CacheStats {
        let memory = &self.inner.memory;
        let disk = self.inner.disk.usage().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to scan cache directory");
            Default::default()
        });

        CacheStats {
            content_entries: memory.content.len(),
            content_capacity: memory.content.capacity(),
            metadata_entries: memory.metadata.len(),
            metadata_capacity: memory.metadata.capacity(),
            outline_entries: memory.outline.len(),
            outline_capacity: memory.outline.capacity(),
            disk_files: disk.files,
            disk_bytes: disk.bytes,
        }
    }

    // ========================================================================
    // Background work
    // ========================================================================

    /// Wait until every background task scheduled so far has finished
    pub async fn flush(&self) {
        let pending = &self.inner.pending;
        loop {
            let idle = pending.idle.notified();
            if pending.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            idle.await;
        }
    }

    /// Number of background tasks still running
    pub fn pending_tasks(&self) -> usize {
        self.inner.pending.count.load(Ordering::SeqCst)
    }

    pub(crate) fn is_expired(&self, entry: &CacheEntry) -> bool {
        let ttl = i64::try_from(self.inner.config.ttl.as_millis()).unwrap_or(i64::MAX);
        entry.age_millis(self.inner.clock.now_millis()) > ttl
    }

    /// Remove a content entry if it still carries `cached_at`, queueing
    /// deletion of its disk shadow. Returns whether it was removed.
    pub(crate) fn remove_expired(&self, path: &str, cached_at: i64) -> bool {
        let queue = self.inner.disk_queue.lock();
        let removed = self
            .inner
            .memory
            .content
            .remove_if(path, |entry| entry.cached_at == cached_at)
            .is_some();
        if removed {
            self.enqueue_disk(&queue, DiskOp::Delete(path.to_string()));
        }
        removed
    }

    pub(crate) fn spawn_background<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let guard = PendingGuard::new(&self.inner.pending);
        self.inner.runtime.spawn(async move {
            let _guard = guard;
            task.await;
        });
    }

    fn enqueue_disk(&self, queue: &mpsc::UnboundedSender<DiskJob>, op: DiskOp) {
        let job = DiskJob {
            op,
            _guard: PendingGuard::new(&self.inner.pending),
        };
        // A failed send hands the job back and drops its guard
        if queue.send(job).is_err() {
            tracing::debug!("Disk worker stopped, dropping disk operation");
        }
    }
}

/// Apply disk jobs one at a time, in the order they were queued
async fn run_disk_worker(disk: Arc<DiskTier>, mut jobs: mpsc::UnboundedReceiver<DiskJob>) {
    while let Some(job) = jobs.recv().await {
        match &job.op {
            DiskOp::Write { path, entry } => {
                if let Err(e) = disk.write(path, entry).await {
                    tracing::warn!(path = %path, error = %e, "Failed to write cache file");
                }
            }
            DiskOp::Delete(path) => {
                if let Err(e) = disk.delete(path).await {
                    tracing::warn!(path = %path, error = %e, "Failed to delete cache file");
                }
            }
            DiskOp::Clear => match disk.clear().await {
                Ok(summary) => tracing::info!(
                    removed = summary.removed,
                    failed = summary.failed,
                    "Cleared disk cache"
                ),
                Err(e) => tracing::warn!(error = %e, "Failed to clear disk cache"),
            },
        }
    }
}
