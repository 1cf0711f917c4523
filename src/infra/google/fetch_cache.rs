use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;

/// One cached response body, stored as `<sha256(url)>.json`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    url: String,
    cached_at: DateTime<Utc>,
    body: serde_json::Value,
}

/// Time-bounded JSON response cache on disk, keyed by request URL.
///
/// Cache problems never fail a build: unreadable entries count as misses and
/// failed writes are only logged.
pub struct FetchCache {
    dir: PathBuf,
    duration: Duration,
    write_seq: AtomicU64,
}

impl FetchCache {
    pub fn new(dir: impl AsRef<Path>, duration: Duration) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            duration,
            write_seq: AtomicU64::new(0),
        }
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    /// Returns the cached body for `url` if it is younger than the cache duration.
    pub async fn get(&self, url: &str) -> Option<serde_json::Value> {
        self.get_at(url, Utc::now()).await
    }

    async fn get_at(&self, url: &str, now: DateTime<Utc>) -> Option<serde_json::Value> {
        let path = self.entry_path(url);
        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(url, "Failed to read cache entry: {}", e);
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&text) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(url, "Ignoring corrupt cache entry: {}", e);
                return None;
            }
        };

        if entry.url != url {
            return None;
        }

        // An entry stamped in the future (clock skew) counts as fresh.
        let fresh = match (now - entry.cached_at).to_std() {
            Ok(age) => age < self.duration,
            Err(_) => true,
        };
        if !fresh {
            tracing::debug!(url, cached_at = %entry.cached_at, "Cache entry expired");
            return None;
        }

        Some(entry.body)
    }

    /// Stores `body` for `url`, replacing any previous entry atomically.
    pub async fn put(&self, url: &str, body: &serde_json::Value) {
        self.put_at(url, body, Utc::now()).await
    }

    async fn put_at(&self, url: &str, body: &serde_json::Value, now: DateTime<Utc>) {
        if let Err(e) = fs::create_dir_all(&self.dir).await {
            tracing::warn!(dir = %self.dir.display(), "Failed to create cache directory: {}", e);
            return;
        }

        let entry = CacheEntry {
            url: url.to_string(),
            cached_at: now,
            body: body.clone(),
        };
        let text = match serde_json::to_string(&entry) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(url, "Failed to encode cache entry: {}", e);
                return;
            }
        };

        let path = self.entry_path(url);
        let tmp = path.with_extension(format!(
            "tmp-{}-{}",
            std::process::id(),
            self.write_seq.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = fs::write(&tmp, text).await {
            tracing::warn!(url, "Failed to write cache entry: {}", e);
            return;
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            tracing::warn!(url, "Failed to commit cache entry: {}", e);
            let _ = fs::remove_file(&tmp).await;
        }
    }
}
