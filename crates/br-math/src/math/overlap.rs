//! Time-span overlap and epoch hour alignment.
//!
//! All timestamps are integer milliseconds since the Unix epoch. Spans are
//! half-open `[start, end)` for overlap purposes.

use serde::{Deserialize, Serialize};

/// Milliseconds in one hour, as a signed timestamp offset.
pub const HOUR_MS: i64 = 3_600_000;

/// Align a timestamp down to the start of its epoch hour.
///
/// Uses Euclidean division so pre-epoch timestamps also align downward.
pub fn floor_to_hour(t: i64) -> i64 {
    t.div_euclid(HOUR_MS) * HOUR_MS
}

/// Length of the intersection of `[a_start, a_end)` and `[b_start, b_end)`.
pub fn overlap_ms(a_start: i64, a_end: i64, b_start: i64, b_end: i64) -> i64 {
    let start = a_start.max(b_start);
    let end = a_end.min(b_end);
    (end - start).max(0)
}

/// Whether `[outer_start, outer_end]` fully contains `[inner_start, inner_end]`.
pub fn contains_span(outer_start: i64, outer_end: i64, inner_start: i64, inner_end: i64) -> bool {
    outer_start <= inner_start && inner_end <= outer_end
}

/// Scale `amount` by `part / whole`.
///
/// Returns 0.0 for a non-positive `whole`.
pub fn prorate(amount: f64, part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    amount * (part as f64 / whole as f64)
}

/// One hour-bucket piece of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourSegment {
    /// Epoch-aligned start of the hour.
    pub hour_start: i64,
    /// Milliseconds of the span that fall inside this hour.
    pub overlap_ms: i64,
}

/// Iterator over the epoch hours a span touches.
#[derive(Debug, Clone)]
pub struct HourSegments {
    cursor: i64,
    start: i64,
    end: i64,
}

impl Iterator for HourSegments {
    type Item = HourSegment;

    fn next(&mut self) -> Option<HourSegment> {
        if self.cursor >= self.end {
            return None;
        }
        let hour_start = self.cursor;
        let hour_end = hour_start.saturating_add(HOUR_MS);
        let overlap = overlap_ms(self.start, self.end, hour_start, hour_end);
        self.cursor = hour_end;
        Some(HourSegment {
            hour_start,
            overlap_ms: overlap,
        })
    }
}

/// Split `[start, end)` into epoch-aligned hour segments.
///
/// An empty or inverted span yields nothing.
pub fn hour_segments(start: i64, end: i64) -> HourSegments {
    HourSegments {
        cursor: if end > start { floor_to_hour(start) } else { end },
        start,
        end,
    }
}
