//! Expiration sweep and periodic maintenance

use std::time::Duration;

use tokio::task::JoinHandle;

use super::coordinator::DocumentCache;

/// Default interval between maintenance sweeps: 5 minutes
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

impl DocumentCache {
    /// Remove content entries older than the configured TTL.
    ///
    /// Works from a snapshot of the content cache. An entry is removed only
    /// if it still carries the timestamp seen in the snapshot, so content
    /// re-cached in the meantime survives. Disk shadows of removed entries
    /// are deleted in the background.
    ///
    /// Returns the number of entries removed from memory.
    pub fn cleanup_expired_entries(&self) -> usize {
        let expired: Vec<(String, i64)> = self
            .inner
            .memory
            .content
            .snapshot()
            .into_iter()
            .filter(|(_, entry)| self.is_expired(entry))
            .map(|(path, entry)| (path, entry.cached_at))
            .collect();

        let mut removed = 0;
        for (path, cached_at) in expired {
            if self.remove_expired(&path, cached_at) {
                tracing::debug!(path = %path, "Expired cache entry");
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(count = removed, "Cleaned up expired cache entries");
        }

        removed
    }

    /// Start a background task that runs the expiration sweep every
    /// `interval`
    pub fn start_maintenance_task(&self, interval: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        self.inner.runtime.spawn(async move {
            let mut interval = tokio::time::interval(interval);

            loop {
                interval.tick().await;
                cache.cleanup_expired_entries();
            }
        })
    }
}
