use std::{
    path::Path,
    sync::Arc,
    time::{Duration, Instant},
};

use moka::{sync::Cache, Expiry};
use tracing::debug;

use crate::domain::models::Artifact;

#[derive(Debug, Clone)]
struct CacheEntry {
    artifact: Arc<Artifact>,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }
}

/// Gives every entry the TTL it was stored with.
struct EntryTtl;

impl Expiry<String, CacheEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Maps normalized request signatures to converted artifacts.
///
/// The artifact file is the authority: an entry whose file has disappeared
/// is dropped on read and reported as a miss. Artifacts are shared with
/// in-flight responses, so leaving the cache never deletes a file that is
/// still being sent.
#[derive(Clone)]
pub struct ResultCache {
    entries: Cache<String, CacheEntry>,
    default_ttl: Duration,
}

impl ResultCache {
    pub fn new(max_capacity: u64, default_ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(EntryTtl)
                .build(),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub async fn get(&self, key: &str) -> Option<Arc<Artifact>> {
        let entry = self.entries.get(key)?;

        if entry.is_expired() {
            self.evict_if_current(key, &entry);
            return None;
        }

        if !is_file(entry.artifact.path()).await {
            debug!(
                "Cached artifact {} for {} is gone, treating as miss",
                entry.artifact.path().display(),
                key
            );
            self.evict_if_current(key, &entry);
            return None;
        }

        Some(entry.artifact)
    }

    /// Stores `artifact` under `key`, replacing any previous entry.
    pub fn set(&self, key: impl Into<String>, artifact: Arc<Artifact>, ttl: Duration) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                artifact,
                created_at: Instant::now(),
                ttl,
            },
        );
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.invalidate(key);
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    #[cfg(test)]
    pub(crate) fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }

    // A concurrent `set` may have replaced the stale entry already.
    fn evict_if_current(&self, key: &str, stale: &CacheEntry) {
        if let Some(current) = self.entries.get(key) {
            if Arc::ptr_eq(&current.artifact, &stale.artifact) {
                self.entries.invalidate(key);
            }
        }
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::domain::models::ImageFormat;

    fn artifact(dir: &Path, name: &str) -> Arc<Artifact> {
        let path = dir.join(name);
        std::fs::write(&path, name.as_bytes()).unwrap();
        Arc::new(Artifact::new(path, ImageFormat::Png))
    }

    fn cache() -> ResultCache {
        ResultCache::new(100, Duration::from_secs(600))
    }

    #[tokio::test]
    async fn hit_returns_the_stored_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache();
        let stored = artifact(dir.path(), "a.png");

        cache.set("alice?s=64", stored.clone(), cache.default_ttl());

        let hit = cache.get("alice?s=64").await.unwrap();
        assert!(Arc::ptr_eq(&hit, &stored));
        assert!(cache.get("alice?s=32").await.is_none());
    }

    #[tokio::test]
    async fn deleted_artifact_is_a_miss_and_is_evicted() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache();
        let stored = artifact(dir.path(), "a.png");
        let path = stored.path().to_path_buf();

        cache.set("alice", stored, cache.default_ttl());
        std::fs::remove_file(&path).unwrap();

        assert!(cache.get("alice").await.is_none());
        cache.entries.run_pending_tasks();
        assert_eq!(cache.entries.entry_count(), 0);
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache();

        cache.set("alice", artifact(dir.path(), "a.png"), Duration::ZERO);

        assert!(cache.get("alice").await.is_none());
    }

    #[tokio::test]
    async fn set_overwrites_and_releases_the_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache();
        let first_path: PathBuf = dir.path().join("first.png");

        cache.set("alice", artifact(dir.path(), "first.png"), cache.default_ttl());
        let second = artifact(dir.path(), "second.png");
        cache.set("alice", second.clone(), cache.default_ttl());
        cache.entries.run_pending_tasks();

        let hit = cache.get("alice").await.unwrap();
        assert!(Arc::ptr_eq(&hit, &second));
        assert!(!first_path.exists());
    }

    #[tokio::test]
    async fn invalidated_artifact_survives_while_still_streaming() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache();
        let stored = artifact(dir.path(), "a.png");
        let path = stored.path().to_path_buf();

        cache.set("alice", stored, cache.default_ttl());
        let streaming = cache.get("alice").await.unwrap();

        cache.invalidate("alice");
        cache.entries.run_pending_tasks();
        assert!(cache.get("alice").await.is_none());
        assert!(path.exists());

        drop(streaming);
        assert!(!path.exists());
    }
}
