//! Engine configuration types.
//!
//! Mirrors `burnrate.json`. Every section has defaults so a partial file
//! only overrides what it names.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::validate::ValidationError;

const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Schema version; must match `CONFIG_SCHEMA_VERSION`.
    pub schema_version: String,

    /// Lookback windows used by reports and charts.
    pub windows: WindowSettings,

    /// Snapshot log retention.
    pub retention: RetentionSettings,

    /// Collector batching and timeouts.
    pub collector: CollectorSettings,

    /// Registry field limits.
    pub registry: RegistrySettings,

    /// Report paging.
    pub report: ReportSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            windows: WindowSettings::default(),
            retention: RetentionSettings::default(),
            collector: CollectorSettings::default(),
            registry: RegistrySettings::default(),
            report: ReportSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }
}

/// Lookback windows in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub short_ms: i64,
    pub day_ms: i64,
    pub week_ms: i64,
    pub month_ms: i64,
    /// Window shown by hourly charts.
    pub chart_ms: i64,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            short_ms: HOUR_MS,
            day_ms: DAY_MS,
            week_ms: 7 * DAY_MS,
            month_ms: 30 * DAY_MS,
            chart_ms: 7 * DAY_MS,
        }
    }
}

/// Snapshot log retention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionSettings {
    /// Maximum number of snapshots kept; oldest are evicted first.
    pub max_snapshots: usize,

    /// Snapshots older than this (relative to the newest) are evicted.
    pub max_age_ms: Option<i64>,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            // 30 days of hourly collection
            max_snapshots: 720,
            max_age_ms: Some(30 * DAY_MS),
        }
    }
}

/// Collector batching and timeouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorSettings {
    /// Maximum concurrent per-entity queries in one batch.
    pub batch_size: usize,

    /// Timeout applied to each remote call.
    pub call_timeout_ms: u64,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            batch_size: 50,
            call_timeout_ms: 30_000,
        }
    }
}

/// Registry field limits (bytes, truncated at a UTF-8 boundary).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    pub max_group_bytes: usize,
    pub max_website_bytes: usize,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            max_group_bytes: 100,
            max_website_bytes: 200,
        }
    }
}

/// Report paging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Upper bound on leaderboard page size.
    pub max_page_size: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            max_page_size: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.schema_version, crate::CONFIG_SCHEMA_VERSION);
        assert_eq!(config.windows.day_ms, 86_400_000);
        assert_eq!(config.retention.max_snapshots, 720);
        assert_eq!(config.collector.batch_size, 50);
        assert_eq!(config.registry.max_group_bytes, 100);
        assert_eq!(config.report.max_page_size, 1000);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            EngineConfig::from_json(r#"{"collector": {"batch_size": 8}}"#).unwrap();
        assert_eq!(config.collector.batch_size, 8);
        assert_eq!(config.collector.call_timeout_ms, 30_000);
        assert_eq!(config.windows, WindowSettings::default());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = EngineConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
    }

    #[test]
    fn test_round_trip() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }
}
