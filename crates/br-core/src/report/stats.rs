//! Dataset-wide counts.

use super::Reports;
use crate::store::Dataset;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub entity_count: usize,
    pub valid_entity_count: usize,
    pub snapshot_count: usize,
    /// Distinct groups named by any registry record.
    pub tracked_groups: usize,
    pub newest_snapshot: Option<i64>,
    pub oldest_snapshot: Option<i64>,
}

impl Stats {
    pub fn from_dataset(ds: &Dataset) -> Self {
        Stats {
            entity_count: ds.registry.len(),
            valid_entity_count: ds.registry.valid().count(),
            snapshot_count: ds.snapshots.len(),
            tracked_groups: ds.registry.tracked_group_count(),
            newest_snapshot: ds.snapshots.latest().map(|s| s.timestamp),
            oldest_snapshot: ds.snapshots.oldest().map(|s| s.timestamp),
        }
    }
}

impl Reports<'_> {
    pub fn stats(&self) -> Stats {
        Stats::from_dataset(self.dataset())
    }
}
