//! Content-addressed cache of processed snapshots.
//!
//! Snapshots are keyed by the BLAKE3 hash of their JSON encoding, so two
//! fetches of identical data share one built graph. Entries are evicted
//! least-recently-used first once `capacity` is reached. Failed builds are
//! never cached.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::GraphError;
use crate::model::Snapshot;
use crate::view::ProcessedSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("failed to hash snapshot: {0}")]
    Hash(#[from] serde_json::Error),
}

/// Hex BLAKE3 digest of the snapshot's JSON encoding.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] if the snapshot cannot be encoded.
pub fn content_hash(snapshot: &Snapshot) -> Result<String, serde_json::Error> {
    let mut hasher = blake3::Hasher::new();
    serde_json::to_writer(&mut hasher, snapshot)?;
    Ok(hasher.finalize().to_hex().to_string())
}

pub struct SnapshotCache {
    entries: LruCache<String, Arc<ProcessedSnapshot>>,
}

impl SnapshotCache {
    /// A cache holding at most `capacity` snapshots (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    /// Return the processed form of `snapshot`, building it on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Graph`] if the graph cannot be built and
    /// [`CacheError::Hash`] if the snapshot cannot be hashed.
    pub fn get_or_process(&mut self, snapshot: &Snapshot) -> Result<Arc<ProcessedSnapshot>, CacheError> {
        let key = content_hash(snapshot)?;
        if let Some(hit) = self.entries.get(&key) {
            debug!(%key, "snapshot cache hit");
            return Ok(Arc::clone(hit));
        }
        let processed = Arc::new(ProcessedSnapshot::process(snapshot.clone())?);
        debug!(%key, "snapshot cache miss");
        self.entries.put(key, Arc::clone(&processed));
        Ok(processed)
    }
}

impl std::fmt::Debug for SnapshotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.entries.cap())
            .finish()
    }
}
