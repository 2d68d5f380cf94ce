//! Configuration loading for the burnrate CLI and engine.
//!
//! This module handles:
//! - Locating burnrate.json (CLI > env > XDG > system > defaults)
//! - Schema checks (shape/type via serde, schema_version)
//! - Semantic validation (window ordering, non-zero limits)
//! - Data directory resolution

pub use br_config::validate::ValidationError;
pub use br_config::{
    CollectorSettings, ConfigSource, EngineConfig, RegistrySettings, ReportSettings,
    RetentionSettings, WindowSettings,
};

use br_config::resolve::{resolve_config, resolve_data_dir};
use br_config::validate::validate_config;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use br_config::CONFIG_SCHEMA_VERSION;

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Semantic validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

/// Configuration resolution options.
#[derive(Debug, Default)]
pub struct ConfigOptions {
    /// Explicit config file path (highest priority).
    pub config_path: Option<PathBuf>,
    /// Explicit data directory.
    pub data_dir: Option<PathBuf>,
}

/// Resolved configuration with provenance information.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub engine: EngineConfig,
    /// Path the config was read from (None when using defaults).
    pub config_path: Option<PathBuf>,
    pub source: ConfigSource,
    /// Directory holding snapshots.json and registry.json.
    pub data_dir: PathBuf,
}

/// Serializable view used by `burnrate config show`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigReport<'a> {
    pub source: String,
    pub config_path: Option<&'a Path>,
    pub data_dir: &'a Path,
    pub config: &'a EngineConfig,
}

impl ResolvedConfig {
    pub fn report(&self) -> ConfigReport<'_> {
        ConfigReport {
            source: self.source.to_string(),
            config_path: self.config_path.as_deref(),
            data_dir: &self.data_dir,
            config: &self.engine,
        }
    }
}

impl crate::report::Render for ConfigReport<'_> {
    fn markdown(&self) -> String {
        let w = &self.config.windows;
        format!(
            "# burnrate config\n\n\
             - Source: {}\n\
             - Config file: {}\n\
             - Data directory: {}\n\
             - Windows (ms): short={} day={} week={} month={} chart={}\n\
             - Retention: max {} snapshots, max age {}\n\
             - Collector: batch {} calls, timeout {}ms\n",
            self.source,
            self.config_path
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in defaults".to_string()),
            self.data_dir.display(),
            w.short_ms,
            w.day_ms,
            w.week_ms,
            w.month_ms,
            w.chart_ms,
            self.config.retention.max_snapshots,
            self.config
                .retention
                .max_age_ms
                .map(|ms| format!("{}ms", ms))
                .unwrap_or_else(|| "unlimited".to_string()),
            self.config.collector.batch_size,
            self.config.collector.call_timeout_ms,
        )
    }

    fn summary(&self) -> String {
        format!("config: {} data: {}", self.source, self.data_dir.display())
    }
}

/// Load configuration with the standard resolution order.
///
/// An explicit `config_path` that does not exist is an error rather than a
/// silent fall-through to defaults.
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    if let Some(path) = &options.config_path {
        if !path.exists() {
            return Err(ConfigError::NotFound { path: path.clone() });
        }
    }

    let paths = resolve_config(options.config_path.as_deref());
    let engine = match &paths.config {
        Some(path) => load_engine_from_file(path)?,
        None => EngineConfig::default(),
    };

    validate_config(&engine)?;

    Ok(ResolvedConfig {
        engine,
        config_path: paths.config,
        source: paths.config_source,
        data_dir: resolve_data_dir(options.data_dir.as_deref()),
    })
}

fn load_engine_from_file(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let engine: EngineConfig =
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

    if engine.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(ConfigError::VersionMismatch {
            path: path.to_path_buf(),
            expected: CONFIG_SCHEMA_VERSION.to_string(),
            actual: engine.schema_version,
        });
    }

    Ok(engine)
}
