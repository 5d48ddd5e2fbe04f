//! Storage module for persisting crawl snapshots
//!
//! Each pipeline run owns one snapshot file. The crawl snapshot is the
//! registry as a JSON array (`null` for pending slots); the enrichment
//! snapshot is the link cache as a JSON object. Snapshots are written only
//! when a run fails and are removed once the whole job succeeds.

mod json;
mod traits;

pub use json::JsonSnapshot;
pub use traits::{SnapshotStore, StorageError, StorageResult};

use crate::config::SnapshotConfig;

/// Opens the crawl and enrichment snapshots named by the configuration
pub fn open_snapshots(config: &SnapshotConfig) -> (JsonSnapshot, JsonSnapshot) {
    (
        JsonSnapshot::new(config.crawl_path()),
        JsonSnapshot::new(config.enrichment_path()),
    )
}
