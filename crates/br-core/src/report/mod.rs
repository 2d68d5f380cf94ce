//! Read-side reports built on the burn engine.
//!
//! [`Reports`] pairs a loaded dataset with the configured windows and page
//! limits. Each report is a plain serializable value; [`render`] turns any
//! of them into the CLI's json, md, or summary output.

pub mod detail;
pub mod leaderboard;
pub mod query;
pub mod render;
pub mod stats;

pub use detail::{DetailRates, EntityDetail};
pub use leaderboard::{
    GroupBoard, GroupEntry, Leaderboard, LeaderboardEntry, MemberList, Page, RateSet,
};
pub use query::{GroupIntervalsReport, GroupRateReport, HourlyReport, IntervalsReport, RateReport};
pub use render::{render, Render};
pub use stats::Stats;

use crate::burn::BurnEngine;
use crate::store::Dataset;
use br_config::{EngineConfig, ReportSettings, WindowSettings};

/// Report builder over one dataset snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Reports<'a> {
    engine: BurnEngine<'a>,
    windows: &'a WindowSettings,
    paging: &'a ReportSettings,
    now_ms: Option<i64>,
}

impl<'a> Reports<'a> {
    pub fn new(dataset: &'a Dataset, config: &'a EngineConfig) -> Self {
        Reports {
            engine: BurnEngine::new(dataset),
            windows: &config.windows,
            paging: &config.report,
            now_ms: None,
        }
    }

    /// Evaluate windows relative to `now_ms` instead of the newest snapshot.
    pub fn at(mut self, now_ms: Option<i64>) -> Self {
        self.now_ms = now_ms;
        self
    }

    pub fn engine(&self) -> BurnEngine<'a> {
        self.engine
    }

    fn dataset(&self) -> &'a Dataset {
        self.engine.dataset()
    }
}
