pub mod block;
pub mod layout;
pub mod summary;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use forky_graph::{CacheError, ForkyConfig, ProcessedSnapshot, Snapshot, SnapshotCache};
use tracing::debug;

/// Read and build every snapshot file, in argument order.
///
/// Files with identical content are built once.
pub fn load_snapshots(files: &[PathBuf], config: &ForkyConfig) -> anyhow::Result<Vec<ProcessedSnapshot>> {
    let mut cache = SnapshotCache::from_config(&config.cache);
    let mut processed = Vec::with_capacity(files.len());
    for path in files {
        let snapshot = read_snapshot(path)?;
        let entry = cache.get_or_process(&snapshot).map_err(|err| match err {
            CacheError::Graph(err) => anyhow::Error::new(err),
            CacheError::Hash(err) => anyhow::Error::new(err),
        });
        let entry = entry.with_context(|| format!("Failed to build graph for {}", path.display()))?;
        processed.push(ProcessedSnapshot::clone(&entry));
    }
    debug!(files = files.len(), built = cache.len(), "loaded snapshots");
    Ok(processed)
}

fn read_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
