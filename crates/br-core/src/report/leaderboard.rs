//! Entity and group leaderboards ranked by daily burn.

use super::Reports;
use crate::burn::{BurnRateEstimate, GroupRateEstimate};
use crate::store::EntityRecord;
use br_common::amount::{decimal, decimal_opt};
use br_common::{Amount, EntityId, Error, GroupName, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Estimates over the short, day, and week windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSet<E> {
    #[serde(rename = "1h")]
    pub hour: Option<E>,
    #[serde(rename = "24h")]
    pub day: Option<E>,
    #[serde(rename = "7d")]
    pub week: Option<E>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub entity_id: EntityId,
    pub group: Option<GroupName>,
    pub website: Option<String>,
    #[serde(with = "decimal_opt")]
    pub balance: Option<Amount>,
    pub rates: RateSet<BurnRateEstimate>,
}

impl LeaderboardEntry {
    pub fn day_rate(&self) -> Option<Amount> {
        self.rates.day.as_ref().map(|e| e.rate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
    /// Valid entities before paging.
    pub total: usize,
    pub offset: usize,
}

/// Requested slice of a leaderboard. `limit` is clamped to the page cap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupEntry {
    pub group: GroupName,
    pub entity_count: usize,
    /// Sum of each member's latest balance.
    #[serde(with = "decimal")]
    pub total_balance: Amount,
    /// First website found among the members.
    pub website: Option<String>,
    pub rates: RateSet<GroupRateEstimate>,
}

/// Ranked valid members of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberList {
    pub group: GroupName,
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBoard {
    pub groups: Vec<GroupEntry>,
}

/// Highest rate first; no data sorts last.
fn by_rate_desc(a: Option<Amount>, b: Option<Amount>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl Reports<'_> {
    fn entry(&self, record: &EntityRecord) -> LeaderboardEntry {
        let id = record.entity_id.as_str();
        let rate = |window_ms| self.engine.estimate_rate(id, window_ms, self.now_ms);
        LeaderboardEntry {
            entity_id: record.entity_id.clone(),
            group: record.group.clone(),
            website: record.website.clone(),
            balance: self.dataset().snapshots.latest_balance(id),
            rates: RateSet {
                hour: rate(self.windows.short_ms),
                day: rate(self.windows.day_ms),
                week: rate(self.windows.week_ms),
            },
        }
    }

    fn ranked<'r>(&self, records: impl Iterator<Item = &'r EntityRecord>) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = records.map(|r| self.entry(r)).collect();
        entries.sort_by(|a, b| {
            by_rate_desc(a.day_rate(), b.day_rate()).then_with(|| a.entity_id.cmp(&b.entity_id))
        });
        entries
    }

    /// Valid entities ranked by 24h rate.
    pub fn leaderboard(&self, page: Page) -> Leaderboard {
        let limit = page
            .limit
            .unwrap_or(self.paging.max_page_size)
            .min(self.paging.max_page_size);
        let ranked = self.ranked(self.dataset().registry.valid());
        let total = ranked.len();
        Leaderboard {
            entries: ranked.into_iter().skip(page.offset).take(limit).collect(),
            total,
            offset: page.offset,
        }
    }

    /// Ranked members of one group.
    pub fn group_members(&self, group: &str) -> Result<MemberList> {
        let entries = self.ranked(self.dataset().registry.members(group));
        if entries.is_empty() {
            return Err(Error::GroupNotFound {
                group: group.to_string(),
            });
        }
        Ok(MemberList {
            group: GroupName::from(group),
            entries,
        })
    }

    /// Every group with a valid member, ranked by 24h group rate.
    pub fn group_leaderboard(&self) -> GroupBoard {
        let ds = self.dataset();
        let rate = |group: &str, window_ms| self.engine.aggregate_rate(group, window_ms, self.now_ms);

        let mut groups: Vec<GroupEntry> = ds
            .registry
            .groups()
            .into_iter()
            .map(|group| {
                let name = group.as_str();
                let members: Vec<&EntityRecord> = ds.registry.members(name).collect();
                GroupEntry {
                    group: group.clone(),
                    entity_count: members.len(),
                    total_balance: members
                        .iter()
                        .filter_map(|r| ds.snapshots.latest_balance(r.entity_id.as_str()))
                        .fold(0, Amount::saturating_add),
                    website: members.iter().find_map(|r| r.website.clone()),
                    rates: RateSet {
                        hour: rate(name, self.windows.short_ms),
                        day: rate(name, self.windows.day_ms),
                        week: rate(name, self.windows.week_ms),
                    },
                }
            })
            .collect();

        groups.sort_by(|a, b| {
            let day = |g: &GroupEntry| g.rates.day.as_ref().map(|e| e.rate);
            by_rate_desc(day(a), day(b)).then_with(|| a.group.cmp(&b.group))
        });
        GroupBoard { groups }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Dataset, EntityImport, ProxyKind, Snapshot};
    use br_common::MS_PER_HOUR;
    use br_config::EngineConfig;

    fn row(id: &str, group: &str, website: Option<&str>, valid: bool) -> EntityImport {
        EntityImport {
            entity_id: EntityId::from(id),
            group: Some(group.to_string()),
            website: website.map(str::to_string),
            proxy_reference: "p".into(),
            proxy_kind: ProxyKind::Status,
            valid: Some(valid),
        }
    }

    fn dataset() -> Dataset {
        let mut ds = Dataset::default();
        ds.registry.import(
            vec![
                row("slow", "g1", None, true),
                row("fast", "g1", Some("https://one.example"), true),
                row("fresh", "g2", None, true),
                row("hidden", "g2", None, false),
                row("quiet", "g3", Some("https://three.example"), true),
            ],
            &Default::default(),
        );
        ds.snapshots.prepend(
            Snapshot::new(0)
                .with_balance("slow", 100)
                .with_balance("fast", 1_000)
                .with_balance("hidden", 1_000_000)
                .with_balance("quiet", 50),
        );
        ds.snapshots.prepend(
            Snapshot::new(MS_PER_HOUR)
                .with_balance("slow", 90)
                .with_balance("fast", 500)
                .with_balance("fresh", 7)
                .with_balance("hidden", 0)
                .with_balance("quiet", 50),
        );
        ds
    }

    #[test]
    fn test_leaderboard_order_and_total() {
        let ds = dataset();
        let config = EngineConfig::default();
        let board = Reports::new(&ds, &config).leaderboard(Page::default());
        let ids: Vec<&str> = board.entries.iter().map(|e| e.entity_id.as_str()).collect();
        // quiet burns 0 but has data; fresh has none and sorts last
        assert_eq!(ids, vec!["fast", "slow", "quiet", "fresh"]);
        assert_eq!(board.total, 4);
        assert_eq!(board.entries[0].balance, Some(500));
        assert!(board.entries[3].rates.day.is_none());
    }

    #[test]
    fn test_leaderboard_paging_clamps_limit() {
        let ds = dataset();
        let mut config = EngineConfig::default();
        config.report.max_page_size = 2;
        let reports = Reports::new(&ds, &config);

        let page = reports.leaderboard(Page {
            offset: 1,
            limit: Some(50),
        });
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.offset, 1);
        assert_eq!(page.entries[0].entity_id.as_str(), "slow");

        let past_end = reports.leaderboard(Page {
            offset: 10,
            limit: None,
        });
        assert!(past_end.entries.is_empty());
        assert_eq!(past_end.total, 4);
    }

    #[test]
    fn test_group_leaderboard() {
        let ds = dataset();
        let config = EngineConfig::default();
        let board = Reports::new(&ds, &config).group_leaderboard();
        let names: Vec<&str> = board.groups.iter().map(|g| g.group.as_str()).collect();
        // g2's only valid member has a single point
        assert_eq!(names, vec!["g1", "g3", "g2"]);

        let g1 = &board.groups[0];
        assert_eq!(g1.entity_count, 2);
        assert_eq!(g1.total_balance, 590);
        assert_eq!(g1.website.as_deref(), Some("https://one.example"));
        assert_eq!(g1.rates.day.as_ref().unwrap().rate, 510);
        assert!(board.groups[2].rates.day.is_none());
    }

    #[test]
    fn test_group_members() {
        let ds = dataset();
        let config = EngineConfig::default();
        let reports = Reports::new(&ds, &config);
        let members = reports.group_members("g2").unwrap();
        assert_eq!(members.group.as_str(), "g2");
        assert_eq!(members.entries.len(), 1);
        assert_eq!(members.entries[0].entity_id.as_str(), "fresh");
        assert!(reports.group_members("missing").is_err());
    }

    #[test]
    fn test_rate_set_serializes_window_keys() {
        let set: RateSet<BurnRateEstimate> = RateSet {
            hour: None,
            day: None,
            week: None,
        };
        let json = serde_json::to_value(&set).unwrap();
        assert!(json.get("24h").is_some());
        assert!(json["7d"].is_null());
    }
}
