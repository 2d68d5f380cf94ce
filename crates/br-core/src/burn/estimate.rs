//! Per-entity rate estimation over a window of points.

use super::inference::infer_top_up_burn;
use super::{classify, Interval};
use crate::store::Point;
use br_common::amount::decimal;
use br_common::{Amount, MS_PER_HOUR};
use br_math::{rate_per_hour, saturating_sum};
use serde::{Deserialize, Serialize};

/// Consumption rate measured over the span the points actually cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnRateEstimate {
    /// Units per hour, rounded to the nearest unit.
    #[serde(with = "decimal")]
    pub rate: Amount,
    pub data_points: usize,
    /// Span between the first and last point, in hours.
    pub actual_hours: f64,
    pub top_up_count: usize,
    #[serde(with = "decimal")]
    pub total_top_ups: Amount,
    /// True when part of the rate comes from top-up inference.
    pub has_inferred_data: bool,
}

/// Intervals with top-up inference applied.
pub fn analyze(points: &[Point]) -> Vec<Interval> {
    let mut intervals = classify(points);
    infer_top_up_burn(&mut intervals);
    intervals
}

/// Estimate from ascending points.
///
/// `None` when there are fewer than two points or they span no time. This
/// is distinct from a zero rate, which means "observed, and nothing burned".
pub fn estimate(points: &[Point]) -> Option<BurnRateEstimate> {
    let (first, last) = match points {
        [first, .., last] => (first, last),
        _ => return None,
    };
    let span_ms = last.t.checked_sub(first.t)?;
    if span_ms <= 0 {
        return None;
    }

    let intervals = analyze(points);
    let total_burn = saturating_sum(intervals.iter().map(Interval::total_burn));
    let top_ups: Vec<&Interval> = intervals.iter().filter(|i| i.is_top_up).collect();

    Some(BurnRateEstimate {
        rate: rate_per_hour(total_burn, span_ms)?,
        data_points: points.len(),
        actual_hours: span_ms as f64 / MS_PER_HOUR as f64,
        top_up_count: top_ups.len(),
        total_top_ups: saturating_sum(top_ups.iter().map(|i| i.top_up_amount)),
        has_inferred_data: !top_ups.is_empty(),
    })
}
