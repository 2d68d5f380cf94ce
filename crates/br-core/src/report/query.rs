//! Single-entity and single-group query payloads.

use super::Reports;
use crate::burn::{BurnRateEstimate, GroupRateEstimate, GroupSlice, HourBucket, Interval};
use br_common::{EntityId, Error, GroupName, Result};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct RateReport {
    pub entity_id: EntityId,
    pub window_ms: i64,
    /// `null` when the window holds fewer than two observations.
    pub estimate: Option<BurnRateEstimate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntervalsReport {
    pub entity_id: EntityId,
    pub window_ms: i64,
    pub intervals: Vec<Interval>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HourlyReport {
    pub entity_id: EntityId,
    pub window_ms: i64,
    pub buckets: Vec<HourBucket>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupRateReport {
    pub group: GroupName,
    pub window_ms: i64,
    pub estimate: Option<GroupRateEstimate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupIntervalsReport {
    pub group: GroupName,
    pub window_ms: i64,
    pub slices: Vec<GroupSlice>,
}

impl Reports<'_> {
    /// Known means registered or observed at least once.
    fn known_entity(&self, entity: &str) -> Result<EntityId> {
        let ds = self.dataset();
        if ds.registry.get(entity).is_some() || ds.snapshots.latest_balance(entity).is_some() {
            Ok(EntityId::from(entity))
        } else {
            Err(Error::EntityNotFound {
                entity_id: entity.to_string(),
            })
        }
    }

    fn known_group(&self, group: &str) -> Result<GroupName> {
        if self.dataset().registry.members(group).next().is_some() {
            Ok(GroupName::from(group))
        } else {
            Err(Error::GroupNotFound {
                group: group.to_string(),
            })
        }
    }

    pub fn rate(&self, entity: &str, window_ms: i64) -> Result<RateReport> {
        Ok(RateReport {
            entity_id: self.known_entity(entity)?,
            window_ms,
            estimate: self.engine.estimate_rate(entity, window_ms, self.now_ms),
        })
    }

    pub fn intervals(&self, entity: &str, window_ms: i64) -> Result<IntervalsReport> {
        Ok(IntervalsReport {
            entity_id: self.known_entity(entity)?,
            window_ms,
            intervals: self.engine.get_intervals(entity, window_ms, self.now_ms),
        })
    }

    /// Hourly chart buckets; `window_ms` defaults to the chart window.
    pub fn hourly(&self, entity: &str, window_ms: Option<i64>) -> Result<HourlyReport> {
        let window_ms = window_ms.unwrap_or(self.windows.chart_ms);
        Ok(HourlyReport {
            entity_id: self.known_entity(entity)?,
            window_ms,
            buckets: self.engine.get_hourly_buckets(entity, window_ms, self.now_ms),
        })
    }

    pub fn group_rate(&self, group: &str, window_ms: i64) -> Result<GroupRateReport> {
        Ok(GroupRateReport {
            group: self.known_group(group)?,
            window_ms,
            estimate: self.engine.aggregate_rate(group, window_ms, self.now_ms),
        })
    }

    pub fn group_intervals(&self, group: &str, window_ms: i64) -> Result<GroupIntervalsReport> {
        Ok(GroupIntervalsReport {
            group: self.known_group(group)?,
            window_ms,
            slices: self.engine.get_group_intervals(group, window_ms, self.now_ms),
        })
    }
}
