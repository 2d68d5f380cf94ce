//! Output rendering for report payloads.
//!
//! JSON is the serde form of the payload. Markdown and summary are written
//! by hand per payload: tables for md, one line for summary.

use super::{
    EntityDetail, GroupBoard, GroupIntervalsReport, GroupRateReport, HourlyReport,
    IntervalsReport, Leaderboard, LeaderboardEntry, MemberList, RateReport, Stats,
};
use crate::burn::{BurnRateEstimate, GroupRateEstimate};
use br_common::amount::format_compact;
use br_common::window::format_hours;
use br_common::{Amount, OutputFormat};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;

/// A payload that can be printed in every output format.
pub trait Render: Serialize {
    fn markdown(&self) -> String;
    fn summary(&self) -> String;
}

/// Render a payload for stdout.
pub fn render<T: Render + ?Sized>(value: &T, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value),
        OutputFormat::Md => Ok(value.markdown()),
        OutputFormat::Summary => Ok(value.summary()),
    }
}

/// UTC wall-clock form of an epoch-millisecond timestamp.
pub fn format_ts(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn format_opt_ts(ms: Option<i64>) -> String {
    ms.map(format_ts).unwrap_or_else(|| "-".to_string())
}

fn per_hour(rate: Amount) -> String {
    format!("{}/h", format_compact(rate))
}

fn rate_cell(est: Option<&BurnRateEstimate>) -> String {
    match est {
        Some(e) if e.has_inferred_data => format!("{}*", per_hour(e.rate)),
        Some(e) => per_hour(e.rate),
        None => "-".to_string(),
    }
}

fn group_rate_cell(est: Option<&GroupRateEstimate>) -> String {
    match est {
        Some(e) if e.has_inferred_data => format!("{}*", per_hour(e.rate)),
        Some(e) => per_hour(e.rate),
        None => "-".to_string(),
    }
}

fn balance_cell(balance: Option<Amount>) -> String {
    balance.map(format_compact).unwrap_or_else(|| "-".to_string())
}

fn entry_table(out: &mut String, entries: &[LeaderboardEntry], offset: usize) {
    let _ = writeln!(out, "| # | Entity | Group | Balance | 1h | 24h | 7d |");
    let _ = writeln!(out, "|---|--------|-------|---------|----|-----|----|");
    for (i, e) in entries.iter().enumerate() {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} |",
            offset + i + 1,
            e.entity_id,
            e.group.as_ref().map(|g| g.as_str()).unwrap_or("-"),
            balance_cell(e.balance),
            rate_cell(e.rates.hour.as_ref()),
            rate_cell(e.rates.day.as_ref()),
            rate_cell(e.rates.week.as_ref()),
        );
    }
    if entries.iter().any(|e| {
        [&e.rates.hour, &e.rates.day, &e.rates.week]
            .into_iter()
            .flatten()
            .any(|x| x.has_inferred_data)
    }) {
        let _ = writeln!(out);
        let _ = writeln!(out, "\\* includes burn inferred across top-ups");
    }
}

fn estimate_lines(out: &mut String, est: &BurnRateEstimate) {
    let _ = writeln!(out, "- Rate: {}", per_hour(est.rate));
    let _ = writeln!(
        out,
        "- Measured over: {} ({} points)",
        format_hours((est.actual_hours * 3_600_000.0) as i64),
        est.data_points
    );
    if est.top_up_count > 0 {
        let _ = writeln!(
            out,
            "- Top-ups: {} totalling {} (burn inferred)",
            est.top_up_count,
            format_compact(est.total_top_ups)
        );
    }
}

impl Render for RateReport {
    fn markdown(&self) -> String {
        let mut out = format!("# Burn rate: {}\n\n", self.entity_id);
        let _ = writeln!(out, "Window: {}", format_hours(self.window_ms));
        let _ = writeln!(out);
        match &self.estimate {
            Some(est) => estimate_lines(&mut out, est),
            None => {
                let _ = writeln!(out, "Not enough data in this window.");
            }
        }
        out
    }

    fn summary(&self) -> String {
        match &self.estimate {
            Some(est) => format!(
                "{}: {} over {:.1}h ({} points, {} top-ups)",
                self.entity_id,
                per_hour(est.rate),
                est.actual_hours,
                est.data_points,
                est.top_up_count
            ),
            None => format!("{}: no data", self.entity_id),
        }
    }
}

impl Render for IntervalsReport {
    fn markdown(&self) -> String {
        let mut out = format!("# Intervals: {}\n\n", self.entity_id);
        let _ = writeln!(out, "| Start | End | Burn | Inferred | Top-up |");
        let _ = writeln!(out, "|-------|-----|------|----------|--------|");
        for i in &self.intervals {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                format_ts(i.start_time),
                format_ts(i.end_time),
                format_compact(i.actual_burn),
                format_compact(i.inferred_burn),
                if i.is_top_up {
                    format_compact(i.top_up_amount)
                } else {
                    "-".to_string()
                },
            );
        }
        out
    }

    fn summary(&self) -> String {
        let top_ups = self.intervals.iter().filter(|i| i.is_top_up).count();
        format!(
            "{}: {} intervals, {} top-ups",
            self.entity_id,
            self.intervals.len(),
            top_ups
        )
    }
}

impl Render for HourlyReport {
    fn markdown(&self) -> String {
        let mut out = format!("# Hourly burn: {}\n\n", self.entity_id);
        let _ = writeln!(out, "| Hour (UTC) | Burn |");
        let _ = writeln!(out, "|------------|------|");
        for b in &self.buckets {
            let _ = writeln!(out, "| {} | {:.0} |", format_ts(b.hour_start), b.burn_amount);
        }
        out
    }

    fn summary(&self) -> String {
        let total: f64 = self.buckets.iter().map(|b| b.burn_amount).sum();
        format!(
            "{}: {} hours, {:.0} burned",
            self.entity_id,
            self.buckets.len(),
            total
        )
    }
}

impl Render for GroupRateReport {
    fn markdown(&self) -> String {
        let mut out = format!("# Group burn rate: {}\n\n", self.group);
        let _ = writeln!(out, "Window: {}", format_hours(self.window_ms));
        let _ = writeln!(out);
        match &self.estimate {
            Some(est) => {
                let _ = writeln!(out, "- Rate: {}", per_hour(est.rate));
                let _ = writeln!(
                    out,
                    "- Entities with data: {} ({} points)",
                    est.entities_with_data, est.total_data_points
                );
                if est.top_ups_detected > 0 {
                    let _ = writeln!(out, "- Entities with top-ups: {}", est.top_ups_detected);
                }
            }
            None => {
                let _ = writeln!(out, "No member has enough data in this window.");
            }
        }
        out
    }

    fn summary(&self) -> String {
        match &self.estimate {
            Some(est) => format!(
                "{}: {} from {} entities",
                self.group,
                per_hour(est.rate),
                est.entities_with_data
            ),
            None => format!("{}: no data", self.group),
        }
    }
}

impl Render for GroupIntervalsReport {
    fn markdown(&self) -> String {
        let mut out = format!("# Group intervals: {}\n\n", self.group);
        let _ = writeln!(out, "| Start | End | Burn | Inferred | Top-up | Members |");
        let _ = writeln!(out, "|-------|-----|------|----------|--------|---------|");
        for s in &self.slices {
            let _ = writeln!(
                out,
                "| {} | {} | {:.0} | {:.0} | {} | {} |",
                format_ts(s.start_time),
                format_ts(s.end_time),
                s.actual_burn,
                s.inferred_burn,
                if s.is_top_up {
                    format!("{:.0}", s.top_up_amount)
                } else {
                    "-".to_string()
                },
                s.contributors,
            );
        }
        out
    }

    fn summary(&self) -> String {
        format!("{}: {} slices", self.group, self.slices.len())
    }
}

impl Render for Leaderboard {
    fn markdown(&self) -> String {
        let mut out = String::from("# Leaderboard\n\n");
        entry_table(&mut out, &self.entries, self.offset);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Showing {} of {} entities from offset {}.",
            self.entries.len(),
            self.total,
            self.offset
        );
        out
    }

    fn summary(&self) -> String {
        match self.entries.first() {
            Some(top) => format!(
                "{} entities; top: {} at {}",
                self.total,
                top.entity_id,
                rate_cell(top.rates.day.as_ref())
            ),
            None => format!("{} entities", self.total),
        }
    }
}

impl Render for MemberList {
    fn markdown(&self) -> String {
        let mut out = format!("# Members of {}\n\n", self.group);
        entry_table(&mut out, &self.entries, 0);
        out
    }

    fn summary(&self) -> String {
        format!("{}: {} members", self.group, self.entries.len())
    }
}

impl Render for GroupBoard {
    fn markdown(&self) -> String {
        let mut out = String::from("# Groups\n\n");
        let _ = writeln!(out, "| # | Group | Entities | Balance | 1h | 24h | 7d | Website |");
        let _ = writeln!(out, "|---|-------|----------|---------|----|-----|----|---------|");
        for (i, g) in self.groups.iter().enumerate() {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} | {} | {} |",
                i + 1,
                g.group,
                g.entity_count,
                format_compact(g.total_balance),
                group_rate_cell(g.rates.hour.as_ref()),
                group_rate_cell(g.rates.day.as_ref()),
                group_rate_cell(g.rates.week.as_ref()),
                g.website.as_deref().unwrap_or("-"),
            );
        }
        out
    }

    fn summary(&self) -> String {
        format!("{} groups", self.groups.len())
    }
}

impl Render for EntityDetail {
    fn markdown(&self) -> String {
        let mut out = format!("# Entity {}\n\n", self.entity_id);
        match &self.record {
            Some(r) => {
                let _ = writeln!(
                    out,
                    "- Group: {}",
                    r.group.as_ref().map(|g| g.as_str()).unwrap_or("-")
                );
                let _ = writeln!(out, "- Website: {}", r.website.as_deref().unwrap_or("-"));
                let _ = writeln!(out, "- Proxy: {} ({})", r.proxy_reference, r.proxy_kind);
                let _ = writeln!(out, "- Valid: {}", r.valid);
            }
            None => {
                let _ = writeln!(out, "- Not registered");
            }
        }
        let _ = writeln!(out, "- Balance: {}", balance_cell(self.balance));
        let _ = writeln!(out);
        let _ = writeln!(out, "| 1h | 24h | 7d | 30d |");
        let _ = writeln!(out, "|----|-----|----|-----|");
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            rate_cell(self.rates.base.hour.as_ref()),
            rate_cell(self.rates.base.day.as_ref()),
            rate_cell(self.rates.base.week.as_ref()),
            rate_cell(self.rates.month.as_ref()),
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "{} observations retained.", self.history.len());
        out
    }

    fn summary(&self) -> String {
        format!(
            "{}: balance {}, 24h {}",
            self.entity_id,
            balance_cell(self.balance),
            rate_cell(self.rates.base.day.as_ref())
        )
    }
}

impl Render for Stats {
    fn markdown(&self) -> String {
        let mut out = String::from("# Stats\n\n");
        let _ = writeln!(
            out,
            "- Entities: {} ({} valid)",
            self.entity_count, self.valid_entity_count
        );
        let _ = writeln!(out, "- Groups: {}", self.tracked_groups);
        let _ = writeln!(out, "- Snapshots: {}", self.snapshot_count);
        let _ = writeln!(out, "- Newest: {}", format_opt_ts(self.newest_snapshot));
        let _ = writeln!(out, "- Oldest: {}", format_opt_ts(self.oldest_snapshot));
        out
    }

    fn summary(&self) -> String {
        format!(
            "{} entities ({} valid), {} groups, {} snapshots",
            self.entity_count, self.valid_entity_count, self.tracked_groups, self.snapshot_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use br_common::EntityId;

    fn estimate(rate: Amount, inferred: bool) -> BurnRateEstimate {
        BurnRateEstimate {
            rate,
            data_points: 4,
            actual_hours: 2.5,
            top_up_count: usize::from(inferred),
            total_top_ups: if inferred { 50 } else { 0 },
            has_inferred_data: inferred,
        }
    }

    #[test]
    fn test_format_ts() {
        assert_eq!(format_ts(0), "1970-01-01 00:00:00");
        assert_eq!(format_ts(3_600_000), "1970-01-01 01:00:00");
    }

    #[test]
    fn test_rate_summary() {
        let report = RateReport {
            entity_id: EntityId::from("a"),
            window_ms: 3_600_000,
            estimate: Some(estimate(4_000_000_000_000, true)),
        };
        assert_eq!(
            report.summary(),
            "a: 4.00T/h over 2.5h (4 points, 1 top-ups)"
        );
        let none = RateReport {
            estimate: None,
            ..report
        };
        assert_eq!(none.summary(), "a: no data");
    }

    #[test]
    fn test_rate_markdown_mentions_top_ups() {
        let report = RateReport {
            entity_id: EntityId::from("a"),
            window_ms: 3_600_000,
            estimate: Some(estimate(10, true)),
        };
        let md = report.markdown();
        assert!(md.starts_with("# Burn rate: a"));
        assert!(md.contains("Top-ups: 1"));
    }

    #[test]
    fn test_render_json_is_serde_form() {
        let stats = Stats {
            entity_count: 1,
            valid_entity_count: 1,
            snapshot_count: 2,
            tracked_groups: 0,
            newest_snapshot: Some(2),
            oldest_snapshot: Some(1),
        };
        let json = render(&stats, OutputFormat::Json).unwrap();
        let back: Stats = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats);
        assert!(render(&stats, OutputFormat::Md).unwrap().contains("Snapshots: 2"));
    }

    #[test]
    fn test_rate_cell_marks_inferred() {
        assert_eq!(rate_cell(Some(&estimate(1_500, true))), "1.50K/h*");
        assert_eq!(rate_cell(Some(&estimate(1_500, false))), "1.50K/h");
        assert_eq!(rate_cell(None), "-");
    }
}
