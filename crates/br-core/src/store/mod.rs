//! Snapshot log, entity registry, and their on-disk form.

pub mod context;
pub mod persist;
pub mod registry;
pub mod snapshot;

pub use context::{DataContext, DatasetSource, StaticSource};
pub use persist::FileStore;
pub use registry::{EntityImport, EntityRecord, EntityUpdate, ProxyKind, Registry};
pub use snapshot::{Point, Snapshot, SnapshotLog};

use br_common::EntityId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors loading or saving the data directory.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<StoreError> for br_common::Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io { source, .. } => br_common::Error::Io(source),
            StoreError::Json { path, source } => {
                br_common::Error::CorruptLog(format!("{}: {}", path.display(), source))
            }
        }
    }
}

/// Everything the engine reads: the snapshot log plus the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub snapshots: SnapshotLog,
    pub registry: Registry,
}

impl Dataset {
    pub fn new(snapshots: SnapshotLog, registry: Registry) -> Self {
        Dataset {
            snapshots,
            registry,
        }
    }

    /// Remove entities from the registry and strip them from every snapshot.
    ///
    /// Returns the ids that had a registry record.
    pub fn remove_entities(&mut self, entities: &[EntityId]) -> Vec<EntityId> {
        let removed = self.registry.remove(entities);
        let balances = self.snapshots.remove_entities(entities);
        tracing::info!(
            target: crate::logging::event_names::REGISTRY_REMOVED,
            records = removed.len() as u64,
            balances = balances as u64,
            "entities removed"
        );
        removed
    }

    /// Empty both the registry and the snapshot log.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.snapshots.clear();
    }
}
