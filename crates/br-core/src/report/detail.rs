//! Single-entity detail view.

use super::{RateSet, Reports};
use crate::burn::BurnRateEstimate;
use crate::store::{EntityRecord, Point};
use br_common::amount::decimal_opt;
use br_common::{Amount, EntityId, Error, Result};
use serde::{Deserialize, Serialize};

/// Leaderboard windows plus the month window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRates {
    #[serde(flatten)]
    pub base: RateSet<BurnRateEstimate>,
    #[serde(rename = "30d")]
    pub month: Option<BurnRateEstimate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDetail {
    pub entity_id: EntityId,
    /// Absent for entities that were observed but never registered.
    pub record: Option<EntityRecord>,
    #[serde(with = "decimal_opt")]
    pub balance: Option<Amount>,
    pub rates: DetailRates,
    /// Every retained observation, oldest first.
    pub history: Vec<Point>,
}

impl Reports<'_> {
    pub fn entity_detail(&self, entity: &str) -> Result<EntityDetail> {
        let ds = self.dataset();
        let record = ds.registry.get(entity).cloned();
        let history = ds.snapshots.history(entity);
        if record.is_none() && history.is_empty() {
            return Err(Error::EntityNotFound {
                entity_id: entity.to_string(),
            });
        }

        let rate = |window_ms| self.engine.estimate_rate(entity, window_ms, self.now_ms);
        Ok(EntityDetail {
            entity_id: EntityId::from(entity),
            record,
            balance: ds.snapshots.latest_balance(entity),
            rates: DetailRates {
                base: RateSet {
                    hour: rate(self.windows.short_ms),
                    day: rate(self.windows.day_ms),
                    week: rate(self.windows.week_ms),
                },
                month: rate(self.windows.month_ms),
            },
            history,
        })
    }
}
