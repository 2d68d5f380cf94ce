//! The snapshot log and per-entity point extraction.
//!
//! Snapshots are kept newest first; index 0 is the latest. An entity
//! missing from a snapshot was not observed at that time. It is never
//! treated as a zero balance.

use br_common::amount::{decimal, decimal_map};
use br_common::{Amount, EntityId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One collection cycle: a timestamp and every balance observed in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,

    #[serde(with = "decimal_map")]
    pub balances: BTreeMap<EntityId, Amount>,
}

impl Snapshot {
    pub fn new(timestamp: i64) -> Self {
        Snapshot {
            timestamp,
            balances: BTreeMap::new(),
        }
    }

    pub fn with_balance(mut self, entity: impl Into<EntityId>, value: Amount) -> Self {
        self.balances.insert(entity.into(), value);
        self
    }

    pub fn balance(&self, entity: &str) -> Option<Amount> {
        self.balances.get(entity).copied()
    }
}

/// One entity's observation at one time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub t: i64,
    #[serde(with = "decimal")]
    pub v: Amount,
}

/// Newest-first log of snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Snapshot>", into = "Vec<Snapshot>")]
pub struct SnapshotLog {
    snapshots: Vec<Snapshot>,
}

impl From<Vec<Snapshot>> for SnapshotLog {
    fn from(snapshots: Vec<Snapshot>) -> Self {
        SnapshotLog::from_snapshots(snapshots)
    }
}

impl From<SnapshotLog> for Vec<Snapshot> {
    fn from(log: SnapshotLog) -> Self {
        log.snapshots
    }
}

impl SnapshotLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from snapshots in any order.
    ///
    /// The result is newest first. Snapshots sharing a timestamp keep their
    /// relative order.
    pub fn from_snapshots(mut snapshots: Vec<Snapshot>) -> Self {
        snapshots.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        SnapshotLog { snapshots }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// The newest snapshot.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.first()
    }

    /// The oldest retained snapshot.
    pub fn oldest(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Timestamp of the newest snapshot; the default "now" for queries.
    pub fn latest_timestamp(&self) -> Option<i64> {
        self.latest().map(|s| s.timestamp)
    }

    /// Iterate newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    /// Iterate oldest first.
    pub fn iter_chronological(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter().rev()
    }

    /// Add a snapshot, keeping the log newest first.
    pub fn prepend(&mut self, snapshot: Snapshot) {
        let pos = self
            .snapshots
            .iter()
            .position(|s| s.timestamp <= snapshot.timestamp)
            .unwrap_or(self.snapshots.len());
        self.snapshots.insert(pos, snapshot);
    }

    /// Drop the oldest snapshots beyond `cap`. Returns how many were evicted.
    pub fn evict_over_cap(&mut self, cap: usize) -> usize {
        if self.snapshots.len() <= cap {
            return 0;
        }
        let evicted = self.snapshots.len() - cap;
        self.snapshots.truncate(cap);
        evicted
    }

    /// Drop snapshots strictly older than `cutoff_ms`. Returns how many were evicted.
    pub fn prune_older_than(&mut self, cutoff_ms: i64) -> usize {
        let before = self.snapshots.len();
        self.snapshots.retain(|s| s.timestamp >= cutoff_ms);
        before - self.snapshots.len()
    }

    /// Points for `entity` with `now - window <= timestamp <= now`, oldest first.
    ///
    /// `now_ms` defaults to the newest snapshot's timestamp. Snapshots newer
    /// than an explicit `now` are ignored.
    pub fn points(&self, entity: &str, window_ms: i64, now_ms: Option<i64>) -> Vec<Point> {
        let Some(now) = now_ms.or_else(|| self.latest_timestamp()) else {
            return Vec::new();
        };
        let cutoff = now.saturating_sub(window_ms);

        self.iter_chronological()
            .filter(|s| s.timestamp >= cutoff && s.timestamp <= now)
            .filter_map(|s| s.balance(entity).map(|v| Point { t: s.timestamp, v }))
            .collect()
    }

    /// Every retained point for `entity`, oldest first.
    pub fn history(&self, entity: &str) -> Vec<Point> {
        self.iter_chronological()
            .filter_map(|s| s.balance(entity).map(|v| Point { t: s.timestamp, v }))
            .collect()
    }

    /// Value in the newest snapshot that contains `entity`.
    pub fn latest_balance(&self, entity: &str) -> Option<Amount> {
        self.iter().find_map(|s| s.balance(entity))
    }

    /// Strip the given entities from every snapshot. Returns how many
    /// balances were removed.
    pub fn remove_entities(&mut self, entities: &[EntityId]) -> usize {
        let mut removed = 0;
        for snapshot in &mut self.snapshots {
            for entity in entities {
                if snapshot.balances.remove(entity).is_some() {
                    removed += 1;
                }
            }
        }
        removed
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}
