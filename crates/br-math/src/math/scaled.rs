//! Exact scaled arithmetic on `u128` amounts.
//!
//! Rates and inferred burns are ratios of large integers. These helpers keep
//! the computation in integer space and only drop to `f64` when the
//! intermediate product would overflow 128 bits.

/// Milliseconds in one hour; the unit rates are expressed in.
pub const MS_PER_HOUR: u128 = 3_600_000;

/// Compute `round(a * b / d)` with ties rounded up.
///
/// Returns 0 when `d == 0`. When `a * b` overflows `u128` the result is
/// computed in `f64` and saturates at `u128::MAX`.
pub fn mul_div_round(a: u128, b: u128, d: u128) -> u128 {
    if d == 0 {
        return 0;
    }
    match a.checked_mul(b) {
        Some(product) => {
            let q = product / d;
            let r = product % d;
            // r >= d - r  <=>  2r >= d, without overflowing 2r.
            if r >= d - r {
                q.saturating_add(1)
            } else {
                q
            }
        }
        None => {
            let approx = (a as f64) * (b as f64) / (d as f64);
            approx.round() as u128
        }
    }
}

/// Units per hour for `total` consumed over `span_ms` milliseconds.
///
/// Returns `None` for a non-positive span.
pub fn rate_per_hour(total: u128, span_ms: i64) -> Option<u128> {
    if span_ms <= 0 {
        return None;
    }
    Some(mul_div_round(total, MS_PER_HOUR, span_ms as u128))
}

/// Sum amounts, saturating at `u128::MAX` instead of wrapping.
pub fn saturating_sum<I>(values: I) -> u128
where
    I: IntoIterator<Item = u128>,
{
    values
        .into_iter()
        .fold(0u128, |acc, v| acc.saturating_add(v))
}

/// Absolute difference split into (decrease, increase) from `prev` to `curr`.
///
/// Exactly one side is non-zero unless the values are equal.
pub fn signed_delta(prev: u128, curr: u128) -> (u128, u128) {
    if curr < prev {
        (prev - curr, 0)
    } else {
        (0, curr - prev)
    }
}
