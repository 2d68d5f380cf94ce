//! Caller-owned handle to the loaded dataset.
//!
//! A [`DataContext`] loads lazily and hands out `Arc<Dataset>` clones.
//! Reloading builds a complete new dataset before swapping it in, so a
//! reader holding an `Arc` keeps a consistent view.

use super::{Dataset, StoreError};
use crate::logging::event_names;
use std::sync::{Arc, RwLock};

/// Something that can produce a fresh [`Dataset`].
pub trait DatasetSource: Send + Sync {
    fn load(&self) -> Result<Dataset, StoreError>;
}

/// A fixed in-memory dataset, handed out as a clone on every load.
#[derive(Debug, Clone, Default)]
pub struct StaticSource(pub Dataset);

impl DatasetSource for StaticSource {
    fn load(&self) -> Result<Dataset, StoreError> {
        Ok(self.0.clone())
    }
}

pub struct DataContext {
    source: Box<dyn DatasetSource>,
    cached: RwLock<Option<Arc<Dataset>>>,
}

impl DataContext {
    pub fn new(source: impl DatasetSource + 'static) -> Self {
        DataContext {
            source: Box::new(source),
            cached: RwLock::new(None),
        }
    }

    /// Context over a fixed dataset.
    pub fn from_dataset(dataset: Dataset) -> Self {
        Self::new(StaticSource(dataset))
    }

    /// The current dataset, loading it on first use.
    pub fn dataset(&self) -> Result<Arc<Dataset>, StoreError> {
        {
            let guard = self.cached.read().unwrap_or_else(|p| p.into_inner());
            if let Some(ds) = guard.as_ref() {
                return Ok(Arc::clone(ds));
            }
        }

        let mut guard = self.cached.write().unwrap_or_else(|p| p.into_inner());
        // Another caller may have loaded while we waited for the write lock.
        if let Some(ds) = guard.as_ref() {
            return Ok(Arc::clone(ds));
        }
        let ds = Arc::new(self.load()?);
        *guard = Some(Arc::clone(&ds));
        Ok(ds)
    }

    /// Drop the cached dataset; the next `dataset()` call reloads.
    pub fn invalidate(&self) {
        let mut guard = self.cached.write().unwrap_or_else(|p| p.into_inner());
        *guard = None;
        tracing::debug!(target: event_names::DATASET_INVALIDATED, "dataset cache invalidated");
    }

    /// Load a fresh dataset and swap it in whole.
    ///
    /// On error the previous dataset stays in place.
    pub fn reload(&self) -> Result<Arc<Dataset>, StoreError> {
        let ds = Arc::new(self.load()?);
        let mut guard = self.cached.write().unwrap_or_else(|p| p.into_inner());
        *guard = Some(Arc::clone(&ds));
        Ok(ds)
    }

    /// Replace the cached dataset with one the caller already built.
    pub fn replace(&self, dataset: Dataset) -> Arc<Dataset> {
        let ds = Arc::new(dataset);
        let mut guard = self.cached.write().unwrap_or_else(|p| p.into_inner());
        *guard = Some(Arc::clone(&ds));
        ds
    }

    fn load(&self) -> Result<Dataset, StoreError> {
        let ds = self.source.load()?;
        tracing::debug!(
            target: event_names::DATASET_LOADED,
            snapshots = ds.snapshots.len() as u64,
            entities = ds.registry.len() as u64,
            "dataset loaded"
        );
        Ok(ds)
    }
}

impl std::fmt::Debug for DataContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let loaded = self
            .cached
            .read()
            .map(|g| g.is_some())
            .unwrap_or(false);
        f.debug_struct("DataContext").field("loaded", &loaded).finish()
    }
}
