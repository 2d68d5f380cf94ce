//! Classification of adjacent points into burn and top-up intervals.

use crate::store::Point;
use br_common::amount::decimal;
use br_common::Amount;
use br_math::signed_delta;
use serde::{Deserialize, Serialize};

/// The span between two adjacent observations of one entity.
///
/// At most one of `actual_burn` and `top_up_amount` is non-zero. A top-up
/// interval hides whatever was consumed during it; `inferred_burn` holds
/// the estimate for that hidden consumption once inference has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start_time: i64,
    pub end_time: i64,
    /// `end_time - start_time`, always positive.
    pub duration: i64,
    #[serde(with = "decimal")]
    pub actual_burn: Amount,
    #[serde(with = "decimal")]
    pub inferred_burn: Amount,
    #[serde(with = "decimal")]
    pub top_up_amount: Amount,
    pub is_top_up: bool,
}

impl Interval {
    /// Classify one adjacent pair. Returns `None` for a non-positive duration.
    pub fn between(prev: Point, curr: Point) -> Option<Self> {
        let duration = curr.t.checked_sub(prev.t)?;
        if duration <= 0 {
            return None;
        }
        let (burn, top_up) = signed_delta(prev.v, curr.v);
        Some(Interval {
            start_time: prev.t,
            end_time: curr.t,
            duration,
            actual_burn: burn,
            inferred_burn: 0,
            top_up_amount: top_up,
            is_top_up: top_up > 0,
        })
    }

    /// Actual plus inferred consumption.
    pub fn total_burn(&self) -> Amount {
        self.actual_burn.saturating_add(self.inferred_burn)
    }

    /// Whether `[start, end]` lies within this interval.
    pub fn contains(&self, start: i64, end: i64) -> bool {
        br_math::contains_span(self.start_time, self.end_time, start, end)
    }
}

/// Classify every adjacent pair of ascending points, in order.
///
/// Pairs with a non-positive duration are skipped. Fewer than two points
/// yield no intervals.
pub fn classify(points: &[Point]) -> Vec<Interval> {
    points
        .windows(2)
        .filter_map(|pair| Interval::between(pair[0], pair[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(t: i64, v: u128) -> Point {
        Point { t, v }
    }

    #[test]
    fn test_burn_interval() {
        let i = Interval::between(p(0, 100), p(10, 90)).unwrap();
        assert_eq!(i.duration, 10);
        assert_eq!(i.actual_burn, 10);
        assert_eq!(i.top_up_amount, 0);
        assert!(!i.is_top_up);
    }

    #[test]
    fn test_top_up_interval() {
        let i = Interval::between(p(0, 100), p(10, 150)).unwrap();
        assert_eq!(i.actual_burn, 0);
        assert_eq!(i.top_up_amount, 50);
        assert!(i.is_top_up);
    }

    #[test]
    fn test_flat_interval_is_not_top_up() {
        let i = Interval::between(p(0, 100), p(10, 100)).unwrap();
        assert_eq!(i.total_burn(), 0);
        assert_eq!(i.top_up_amount, 0);
        assert!(!i.is_top_up);
    }

    #[test]
    fn test_non_positive_duration_skipped() {
        assert!(Interval::between(p(10, 100), p(10, 90)).is_none());
        assert!(Interval::between(p(10, 100), p(5, 90)).is_none());

        let intervals = classify(&[p(0, 100), p(0, 99), p(10, 90)]);
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].start_time, 0);
        assert_eq!(intervals[0].actual_burn, 9);
    }

    #[test]
    fn test_classify_short_inputs() {
        assert!(classify(&[]).is_empty());
        assert!(classify(&[p(0, 1)]).is_empty());
    }

    #[test]
    fn test_classify_preserves_order() {
        let intervals = classify(&[p(0, 100), p(10, 90), p(20, 120), p(30, 110)]);
        let starts: Vec<i64> = intervals.iter().map(|i| i.start_time).collect();
        assert_eq!(starts, vec![0, 10, 20]);
        assert!(intervals[1].is_top_up);
    }
}
