//! Property-based tests for the estimation engine.
//!
//! Uses proptest to check conservation and determinism across random
//! balance histories.

use br_core::burn::{analyze, classify, estimate, hourly_buckets, rollup, BurnRateEstimate};
use br_core::store::Point;
use proptest::prelude::*;

const T0: i64 = 1_700_000_000_000;

/// Ascending points with gaps of one second to three hours.
fn history() -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec((1_000i64..10_800_000, 0u128..1_000_000_000_000_000), 0..40).prop_map(
        |steps| {
            let mut t = T0;
            steps
                .into_iter()
                .map(|(dt, v)| {
                    t += dt;
                    Point { t, v }
                })
                .collect()
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Every adjacent pair yields one interval, and each moves one way only.
    #[test]
    fn intervals_cover_every_pair(points in history()) {
        let intervals = classify(&points);
        prop_assert_eq!(intervals.len(), points.len().saturating_sub(1));
        for (i, iv) in intervals.iter().enumerate() {
            prop_assert_eq!(iv.start_time, points[i].t);
            prop_assert_eq!(iv.end_time, points[i + 1].t);
            prop_assert!(iv.actual_burn == 0 || iv.top_up_amount == 0);
            prop_assert_eq!(iv.is_top_up, iv.top_up_amount > 0);
        }
    }

    /// Balance change is fully explained by observed burn and top-ups.
    #[test]
    fn observed_deltas_are_conserved(points in history()) {
        prop_assume!(points.len() >= 2);
        let intervals = classify(&points);
        let burned: u128 = intervals.iter().map(|i| i.actual_burn).sum();
        let added: u128 = intervals.iter().map(|i| i.top_up_amount).sum();
        let first = points[0].v;
        let last = points[points.len() - 1].v;
        prop_assert_eq!(first + added, last + burned);
    }

    /// Inference only ever touches top-up intervals.
    #[test]
    fn inference_only_fills_top_ups(points in history()) {
        for iv in analyze(&points) {
            if !iv.is_top_up {
                prop_assert_eq!(iv.inferred_burn, 0);
            }
        }
    }

    /// Hourly buckets redistribute burn without creating or losing any.
    #[test]
    fn hourly_buckets_conserve_burn(points in history()) {
        let intervals = analyze(&points);
        let total: f64 = intervals.iter().map(|i| i.total_burn() as f64).sum();
        let bucketed: f64 = hourly_buckets(&intervals).iter().map(|b| b.burn_amount).sum();
        let tolerance = 1e-9 * total.max(1.0);
        prop_assert!((total - bucketed).abs() <= tolerance, "total={} bucketed={}", total, bucketed);

        let buckets = hourly_buckets(&intervals);
        for pair in buckets.windows(2) {
            prop_assert!(pair[0].hour_start < pair[1].hour_start);
        }
        for b in &buckets {
            prop_assert!(b.burn_amount >= 0.0);
        }
    }

    /// Each interval's burn lands entirely in the hours it spans, even when
    /// it crosses several hour boundaries.
    #[test]
    fn hourly_buckets_conserve_each_interval(points in history()) {
        for iv in analyze(&points) {
            let total = iv.total_burn() as f64;
            let buckets = hourly_buckets(std::slice::from_ref(&iv));
            let bucketed: f64 = buckets.iter().map(|b| b.burn_amount).sum();
            prop_assert!(
                (total - bucketed).abs() <= 1e-9 * total.max(1.0),
                "interval {}..{} total={} bucketed={}",
                iv.start_time, iv.end_time, total, bucketed
            );
            if let (Some(first), Some(last)) = (buckets.first(), buckets.last()) {
                prop_assert!(first.hour_start <= iv.start_time);
                prop_assert!(last.hour_start < iv.end_time);
            }
        }
    }

    /// The same points always give the same answer.
    #[test]
    fn estimation_is_idempotent(points in history()) {
        prop_assert_eq!(analyze(&points), analyze(&points));
        prop_assert_eq!(estimate(&points), estimate(&points));
    }

    /// An estimate exists exactly when there are two points, and its counts
    /// match the intervals.
    #[test]
    fn estimate_matches_intervals(points in history()) {
        match estimate(&points) {
            None => prop_assert!(points.len() < 2),
            Some(est) => {
                let intervals = analyze(&points);
                prop_assert_eq!(est.data_points, points.len());
                prop_assert_eq!(est.top_up_count, intervals.iter().filter(|i| i.is_top_up).count());
                prop_assert_eq!(est.has_inferred_data, est.top_up_count > 0);
                prop_assert!(est.actual_hours > 0.0);
            }
        }
    }

    /// Group rate is the sum of member rates, ignoring members without data.
    #[test]
    fn rollup_sums_member_rates(members in prop::collection::vec(history(), 0..6)) {
        let estimates: Vec<Option<BurnRateEstimate>> = members.iter().map(|p| estimate(p)).collect();
        let with_data: Vec<&BurnRateEstimate> = estimates.iter().flatten().collect();

        match rollup(estimates.iter().map(Option::as_ref)) {
            None => prop_assert!(with_data.is_empty()),
            Some(group) => {
                let sum: u128 = with_data.iter().map(|e| e.rate).sum();
                prop_assert_eq!(group.rate, sum);
                prop_assert_eq!(group.entities_with_data, with_data.len());
                prop_assert_eq!(
                    group.total_data_points,
                    with_data.iter().map(|e| e.data_points).sum::<usize>()
                );
            }
        }
    }
}
