//! Estimating consumption hidden inside top-up intervals.
//!
//! A top-up masks whatever the entity consumed while it happened. We assume
//! the entity kept burning at its average observed density over the
//! non-top-up intervals and charge each top-up interval that density times
//! its duration. Deposits themselves never count as burn.

use super::Interval;
use br_common::Amount;
use br_math::{mul_div_round, saturating_sum};

/// Observed burn and the time it was observed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BurnDensity {
    pub burn: Amount,
    pub duration_ms: i64,
}

impl BurnDensity {
    /// Density over the non-top-up intervals.
    pub fn observed(intervals: &[Interval]) -> Self {
        let burning = || intervals.iter().filter(|i| !i.is_top_up);
        BurnDensity {
            burn: saturating_sum(burning().map(|i| i.actual_burn)),
            duration_ms: burning().fold(0i64, |acc, i| acc.saturating_add(i.duration)),
        }
    }

    /// Burn expected over `duration_ms` at this density, rounded half up.
    ///
    /// Zero when no burning time was observed.
    pub fn over(&self, duration_ms: i64) -> Amount {
        if self.duration_ms <= 0 || duration_ms <= 0 {
            return 0;
        }
        mul_div_round(self.burn, duration_ms as u128, self.duration_ms as u128)
    }
}

/// Fill `inferred_burn` on every top-up interval. Returns the density used.
pub fn infer_top_up_burn(intervals: &mut [Interval]) -> BurnDensity {
    let density = BurnDensity::observed(intervals);
    for interval in intervals.iter_mut().filter(|i| i.is_top_up) {
        interval.inferred_burn = density.over(interval.duration);
    }
    density
}
