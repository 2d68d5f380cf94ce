//! Burn rate estimation engine.
//!
//! Pure functions over ascending [`Point`]s turn balance observations into
//! classified intervals, inferred top-up burn, rate estimates, hourly chart
//! buckets, and group rollups. [`BurnEngine`] binds them to one loaded
//! [`Dataset`] so callers can ask by entity id or group name.
//!
//! Nothing here is persisted; every value is recomputed per query.

pub mod estimate;
pub mod group;
pub mod hourly;
pub mod inference;
pub mod interval;

pub use estimate::{analyze, estimate, BurnRateEstimate};
pub use group::{reconcile, rollup, GroupRateEstimate, GroupSlice};
pub use hourly::{hourly_buckets, HourBucket};
pub use inference::{infer_top_up_burn, BurnDensity};
pub use interval::{classify, Interval};

use crate::logging::event_names;
use crate::store::{Dataset, Point};

/// Read-only query surface over one dataset.
///
/// `now_ms` defaults to the newest snapshot's timestamp, so the same
/// dataset always answers the same way.
#[derive(Debug, Clone, Copy)]
pub struct BurnEngine<'a> {
    dataset: &'a Dataset,
}

impl<'a> BurnEngine<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        BurnEngine { dataset }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    fn points(&self, entity: &str, window_ms: i64, now_ms: Option<i64>) -> Vec<Point> {
        self.dataset.snapshots.points(entity, window_ms, now_ms)
    }

    /// Rate for one entity, or `None` with fewer than two points in the window.
    pub fn estimate_rate(
        &self,
        entity: &str,
        window_ms: i64,
        now_ms: Option<i64>,
    ) -> Option<BurnRateEstimate> {
        let points = self.points(entity, window_ms, now_ms);
        let result = estimate(&points);
        match &result {
            Some(est) => tracing::debug!(
                target: event_names::ESTIMATE_DONE,
                entity_id = entity,
                window_ms,
                data_points = est.data_points as u64,
                rate = est.rate,
                top_ups = est.top_up_count as u64,
                "rate estimated"
            ),
            None => tracing::trace!(
                target: event_names::ESTIMATE_INSUFFICIENT,
                entity_id = entity,
                window_ms,
                data_points = points.len() as u64,
                "not enough points for an estimate"
            ),
        }
        result
    }

    /// Classified intervals with inferred top-up burn filled in.
    pub fn get_intervals(&self, entity: &str, window_ms: i64, now_ms: Option<i64>) -> Vec<Interval> {
        let intervals = analyze(&self.points(entity, window_ms, now_ms));
        tracing::trace!(
            target: event_names::ESTIMATE_INTERVALS,
            entity_id = entity,
            intervals = intervals.len() as u64,
            "intervals classified"
        );
        intervals
    }

    pub fn get_hourly_buckets(
        &self,
        entity: &str,
        window_ms: i64,
        now_ms: Option<i64>,
    ) -> Vec<HourBucket> {
        hourly_buckets(&self.get_intervals(entity, window_ms, now_ms))
    }

    /// Summed rate over the valid members of `group`.
    pub fn aggregate_rate(
        &self,
        group: &str,
        window_ms: i64,
        now_ms: Option<i64>,
    ) -> Option<GroupRateEstimate> {
        let estimates: Vec<Option<BurnRateEstimate>> = self
            .dataset
            .registry
            .members(group)
            .map(|r| self.estimate_rate(r.entity_id.as_str(), window_ms, now_ms))
            .collect();
        let result = rollup(estimates.iter().map(Option::as_ref));
        tracing::debug!(
            target: event_names::AGGREGATE_DONE,
            group,
            window_ms,
            members = estimates.len() as u64,
            with_data = result.as_ref().map_or(0, |g| g.entities_with_data) as u64,
            "group rate aggregated"
        );
        result
    }

    /// Member intervals reconciled onto one shared timeline.
    pub fn get_group_intervals(
        &self,
        group: &str,
        window_ms: i64,
        now_ms: Option<i64>,
    ) -> Vec<GroupSlice> {
        let members: Vec<Vec<Interval>> = self
            .dataset
            .registry
            .members(group)
            .map(|r| self.get_intervals(r.entity_id.as_str(), window_ms, now_ms))
            .filter(|intervals| !intervals.is_empty())
            .collect();
        reconcile(&members)
    }
}
