//! JSON files in the data directory.
//!
//! Writes go to a temporary sibling, are synced, then renamed over the
//! target so readers never observe a partially written file.

use super::{Dataset, DatasetSource, Registry, SnapshotLog, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const SNAPSHOTS_FILE: &str = "snapshots.json";
pub const REGISTRY_FILE: &str = "registry.json";

/// Read a JSON file, returning `None` if it does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    if content.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StoreError::Json {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Atomically replace `path` with the pretty-printed JSON of `value`.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let content = serde_json::to_vec_pretty(value).map_err(|e| StoreError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("data.json");
    let tmp_path = path.with_file_name(format!("{}.tmp.{}", file_name, std::process::id()));
    {
        let mut file = std::fs::File::create(&tmp_path).map_err(|e| StoreError::Io {
            path: tmp_path.clone(),
            source: e,
        })?;
        file.write_all(&content).map_err(|e| StoreError::Io {
            path: tmp_path.clone(),
            source: e,
        })?;
        let _ = file.sync_all();
    }
    std::fs::rename(&tmp_path, path).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Snapshot log and registry stored as two JSON files in one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn snapshots_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOTS_FILE)
    }

    pub fn registry_path(&self) -> PathBuf {
        self.dir.join(REGISTRY_FILE)
    }

    /// Missing file loads as an empty log.
    pub fn load_snapshots(&self) -> Result<SnapshotLog, StoreError> {
        Ok(read_json(&self.snapshots_path())?.unwrap_or_default())
    }

    /// Missing file loads as an empty registry.
    pub fn load_registry(&self) -> Result<Registry, StoreError> {
        Ok(read_json(&self.registry_path())?.unwrap_or_default())
    }

    pub fn save_snapshots(&self, log: &SnapshotLog) -> Result<(), StoreError> {
        write_json_atomic(&self.snapshots_path(), log)?;
        tracing::debug!(
            target: crate::logging::event_names::STORE_SAVED,
            path = %self.snapshots_path().display(),
            snapshots = log.len() as u64,
            "snapshot log saved"
        );
        Ok(())
    }

    pub fn save_registry(&self, registry: &Registry) -> Result<(), StoreError> {
        write_json_atomic(&self.registry_path(), registry)?;
        tracing::debug!(
            target: crate::logging::event_names::STORE_SAVED,
            path = %self.registry_path().display(),
            entities = registry.len() as u64,
            "registry saved"
        );
        Ok(())
    }

    pub fn save(&self, dataset: &Dataset) -> Result<(), StoreError> {
        self.save_registry(&dataset.registry)?;
        self.save_snapshots(&dataset.snapshots)
    }
}

impl DatasetSource for FileStore {
    fn load(&self) -> Result<Dataset, StoreError> {
        Ok(Dataset {
            snapshots: self.load_snapshots()?,
            registry: self.load_registry()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Snapshot;
    use tempfile::TempDir;

    #[test]
    fn test_missing_files_load_empty() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("nested"));
        let dataset = store.load().unwrap();
        assert!(dataset.snapshots.is_empty());
        assert!(dataset.registry.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        let log = SnapshotLog::from_snapshots(vec![
            Snapshot::new(1_000).with_balance("a", 7),
            Snapshot::new(2_000).with_balance("a", 5),
        ]);
        store.save_snapshots(&log).unwrap();
        assert_eq!(store.load_snapshots().unwrap(), log);

        // No temp files left behind
        let leftovers: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_corrupt_file_reports_path() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        std::fs::write(store.snapshots_path(), "[{\"timestamp\": \"x\"}]").unwrap();
        let err = store.load_snapshots().unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
        assert!(err.to_string().contains(SNAPSHOTS_FILE));
    }
}
