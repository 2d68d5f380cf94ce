//! Group rollups: summed rates and reconciled interval slices.

use super::{BurnRateEstimate, Interval};
use br_common::amount::decimal;
use br_common::Amount;
use br_math::prorate;
use serde::{Deserialize, Serialize};

/// Sum of member rates, counting only members with an estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRateEstimate {
    #[serde(with = "decimal")]
    pub rate: Amount,
    pub total_data_points: usize,
    pub entities_with_data: usize,
    /// Members whose estimate saw at least one top-up.
    pub top_ups_detected: usize,
    pub has_inferred_data: bool,
}

/// Roll up member estimates. Members without one are left out of every
/// field rather than counted as zero. `None` when no member has data.
pub fn rollup<'a, I>(estimates: I) -> Option<GroupRateEstimate>
where
    I: IntoIterator<Item = Option<&'a BurnRateEstimate>>,
{
    let mut acc = GroupRateEstimate {
        rate: 0,
        total_data_points: 0,
        entities_with_data: 0,
        top_ups_detected: 0,
        has_inferred_data: false,
    };

    for est in estimates.into_iter().flatten() {
        acc.rate = acc.rate.saturating_add(est.rate);
        acc.total_data_points += est.data_points;
        acc.entities_with_data += 1;
        if est.top_up_count > 0 {
            acc.top_ups_detected += 1;
        }
        acc.has_inferred_data |= est.has_inferred_data;
    }

    (acc.entities_with_data > 0).then_some(acc)
}

/// One piece of the group timeline between consecutive member boundaries.
///
/// Amounts are prorated chart projections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSlice {
    pub start_time: i64,
    pub end_time: i64,
    pub duration: i64,
    pub actual_burn: f64,
    pub inferred_burn: f64,
    pub top_up_amount: f64,
    pub is_top_up: bool,
    /// Members with an interval covering this slice.
    pub contributors: usize,
}

/// Reconcile each member's intervals onto one shared timeline.
///
/// The slice boundaries are the union of every member interval boundary.
/// Each member contributes the share of the one interval (if any) that
/// fully contains the slice. Slices in a gap that no member covers are
/// kept with zero totals.
pub fn reconcile(members: &[Vec<Interval>]) -> Vec<GroupSlice> {
    let mut boundaries: Vec<i64> = members
        .iter()
        .flatten()
        .flat_map(|i| [i.start_time, i.end_time])
        .collect();
    boundaries.sort_unstable();
    boundaries.dedup();

    boundaries
        .windows(2)
        .map(|w| slice(members, w[0], w[1]))
        .collect()
}

fn slice(members: &[Vec<Interval>], start: i64, end: i64) -> GroupSlice {
    let duration = end - start;
    let mut out = GroupSlice {
        start_time: start,
        end_time: end,
        duration,
        actual_burn: 0.0,
        inferred_burn: 0.0,
        top_up_amount: 0.0,
        is_top_up: false,
        contributors: 0,
    };

    for intervals in members {
        // Member intervals are ordered and disjoint, so at most one covers.
        let Some(cover) = intervals.iter().find(|i| i.contains(start, end)) else {
            continue;
        };
        out.actual_burn += prorate(cover.actual_burn as f64, duration, cover.duration);
        out.inferred_burn += prorate(cover.inferred_burn as f64, duration, cover.duration);
        out.top_up_amount += prorate(cover.top_up_amount as f64, duration, cover.duration);
        out.is_top_up |= cover.is_top_up;
        out.contributors += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::burn::analyze;
    use crate::store::Point;

    const H: i64 = 3_600_000;
    const T: u128 = 1_000_000_000_000;

    fn p(t: i64, v: u128) -> Point {
        Point { t, v }
    }

    fn est(rate: Amount, points: usize, top_ups: usize) -> BurnRateEstimate {
        BurnRateEstimate {
            rate,
            data_points: points,
            actual_hours: 1.0,
            top_up_count: top_ups,
            total_top_ups: 0,
            has_inferred_data: top_ups > 0,
        }
    }

    #[test]
    fn test_rollup_skips_missing_members() {
        let a = est(3 * T, 4, 0);
        let c = est(2 * T, 3, 1);
        let group = rollup([Some(&a), None, Some(&c)]).unwrap();
        assert_eq!(group.rate, 5 * T);
        assert_eq!(group.entities_with_data, 2);
        assert_eq!(group.total_data_points, 7);
        assert_eq!(group.top_ups_detected, 1);
        assert!(group.has_inferred_data);
    }

    #[test]
    fn test_rollup_without_data_is_none() {
        assert!(rollup([None::<&BurnRateEstimate>, None]).is_none());
        assert!(rollup(Vec::<Option<&BurnRateEstimate>>::new()).is_none());
    }

    #[test]
    fn test_reconcile_offset_members() {
        // A burns 60 over [0, 2h]; B burns 30 over [1h, 3h]
        let a = analyze(&[p(0, 160), p(2 * H, 100)]);
        let b = analyze(&[p(H, 130), p(3 * H, 100)]);
        let slices = reconcile(&[a, b]);

        let spans: Vec<(i64, i64)> = slices.iter().map(|s| (s.start_time, s.end_time)).collect();
        assert_eq!(spans, vec![(0, H), (H, 2 * H), (2 * H, 3 * H)]);
        assert!((slices[0].actual_burn - 30.0).abs() < 1e-9);
        assert_eq!(slices[0].contributors, 1);
        assert!((slices[1].actual_burn - 45.0).abs() < 1e-9);
        assert_eq!(slices[1].contributors, 2);
        assert!((slices[2].actual_burn - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_reconcile_marks_top_up_slices() {
        let a = analyze(&[p(0, 100), p(H, 90), p(2 * H, 200)]);
        let b = analyze(&[p(0, 50), p(2 * H, 40)]);
        let slices = reconcile(&[a, b]);
        assert_eq!(slices.len(), 2);
        assert!(!slices[0].is_top_up);
        assert!(slices[1].is_top_up);
        assert!((slices[1].top_up_amount - 110.0).abs() < 1e-9);
        // A's inferred 10 plus half of B's 10
        assert!((slices[1].inferred_burn - 10.0).abs() < 1e-9);
        assert!((slices[1].actual_burn - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_reconcile_gap_slice_is_empty() {
        let a = analyze(&[p(0, 10), p(H, 5)]);
        let b = analyze(&[p(2 * H, 10), p(3 * H, 5)]);
        let slices = reconcile(&[a, b]);
        assert_eq!(slices.len(), 3);
        assert_eq!(slices[1].contributors, 0);
        assert_eq!(slices[1].actual_burn, 0.0);
    }

    #[test]
    fn test_reconcile_conserves_burn() {
        let a = analyze(&[p(0, 1000), p(H + 7, 900), p(3 * H, 950), p(4 * H, 800)]);
        let b = analyze(&[p(H / 3, 500), p(2 * H, 420)]);
        let expected: f64 = a
            .iter()
            .chain(b.iter())
            .map(|i| i.total_burn() as f64)
            .sum();
        let slices = reconcile(&[a, b]);
        let got: f64 = slices.iter().map(|s| s.actual_burn + s.inferred_burn).sum();
        assert!((got - expected).abs() <= 1e-9 * expected.max(1.0));
    }
}
