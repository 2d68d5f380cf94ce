//! Spreading interval burn across epoch-aligned hour buckets for charts.

use super::Interval;
use br_math::hour_segments;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Burn attributed to one epoch hour. A chart projection, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourBucket {
    pub hour_start: i64,
    pub burn_amount: f64,
}

/// Distribute each interval's actual plus inferred burn uniformly over its
/// duration and sum the pieces per hour, ascending by `hour_start`.
///
/// Every hour an interval touches gets a bucket, even at zero burn, so a
/// chart shows observed-but-idle hours distinctly from unobserved ones.
pub fn hourly_buckets(intervals: &[Interval]) -> Vec<HourBucket> {
    let mut buckets: BTreeMap<i64, f64> = BTreeMap::new();

    for interval in intervals {
        if interval.duration <= 0 {
            continue;
        }
        let burn_per_ms = interval.total_burn() as f64 / interval.duration as f64;
        for segment in hour_segments(interval.start_time, interval.end_time) {
            *buckets.entry(segment.hour_start).or_insert(0.0) +=
                burn_per_ms * segment.overlap_ms as f64;
        }
    }

    buckets
        .into_iter()
        .map(|(hour_start, burn_amount)| HourBucket {
            hour_start,
            burn_amount,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::burn::classify;
    use crate::store::Point;

    const H: i64 = 3_600_000;

    fn p(t: i64, v: u128) -> Point {
        Point { t, v }
    }

    #[test]
    fn test_aligned_interval_fills_one_bucket() {
        let buckets = hourly_buckets(&classify(&[p(H, 100), p(2 * H, 40)]));
        assert_eq!(buckets, vec![HourBucket { hour_start: H, burn_amount: 60.0 }]);
    }

    #[test]
    fn test_straddling_interval_splits_proportionally() {
        // 90 burned from 0:30 to 2:00
        let buckets = hourly_buckets(&classify(&[p(H / 2, 190), p(2 * H, 100)]));
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].hour_start, 0);
        assert!((buckets[0].burn_amount - 30.0).abs() < 1e-9);
        assert_eq!(buckets[1].hour_start, H);
        assert!((buckets[1].burn_amount - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_adjacent_intervals_share_bucket() {
        let buckets = hourly_buckets(&classify(&[p(0, 100), p(H / 2, 90), p(H, 70)]));
        assert_eq!(buckets.len(), 1);
        assert!((buckets[0].burn_amount - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_idle_hours_produce_zero_buckets() {
        let buckets = hourly_buckets(&classify(&[p(0, 5), p(2 * H, 5)]));
        assert_eq!(buckets.len(), 2);
        assert!(buckets.iter().all(|b| b.burn_amount == 0.0));
    }

    #[test]
    fn test_empty_input() {
        assert!(hourly_buckets(&[]).is_empty());
    }
}
