//! Logging configuration.
//!
//! Sources, lowest to highest priority:
//! - built-in defaults (human format, `info`, timestamps on)
//! - `RUST_LOG` (bare level or a `burnrate=<level>` directive)
//! - `BURNRATE_LOG`, `BURNRATE_LOG_FORMAT`, `BURNRATE_LOG_TIMESTAMPS`
//! - CLI flags (`-v`/`-q`, `--log-format`)

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;

pub const ENV_LOG: &str = "BURNRATE_LOG";
pub const ENV_LOG_FORMAT: &str = "BURNRATE_LOG_FORMAT";
pub const ENV_LOG_TIMESTAMPS: &str = "BURNRATE_LOG_TIMESTAMPS";

/// Log output format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per event, for cron and log shippers.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" | "text" | "pretty" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            other => Err(format!("unknown log format {:?} (expected human or jsonl)", other)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LogFormat::Human => "human",
            LogFormat::Jsonl => "jsonl",
        })
    }
}

/// Minimum level that reaches stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

const LEVEL_NAMES: [(&str, LogLevel); 6] = [
    ("trace", LogLevel::Trace),
    ("debug", LogLevel::Debug),
    ("info", LogLevel::Info),
    ("warn", LogLevel::Warn),
    ("error", LogLevel::Error),
    ("off", LogLevel::Off),
];

impl LogLevel {
    /// Level after `verbose` steps down and `quiet` steps up from `info`.
    pub fn from_verbosity(verbose: u8, quiet: u8) -> Self {
        let idx = 2 + i16::from(quiet) - i16::from(verbose);
        LEVEL_NAMES[idx.clamp(0, 5) as usize].1
    }

    pub fn as_str(self) -> &'static str {
        LEVEL_NAMES
            .iter()
            .find(|(_, level)| *level == self)
            .map_or("info", |(name, _)| name)
    }

    /// Level named by a `RUST_LOG` value: a bare level (`debug`) or the
    /// `burnrate` / `br_core` directive. Other crates' directives are ignored.
    fn from_rust_log(value: &str) -> Option<Self> {
        value.split(',').rev().find_map(|directive| {
            match directive.trim().split_once('=') {
                None => directive.parse().ok(),
                Some((target, level)) if matches!(target, "burnrate" | "br_core") => {
                    level.parse().ok()
                }
                Some(_) => None,
            }
        })
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let s = match s.as_str() {
            "warning" => "warn",
            "none" | "quiet" => "off",
            other => other,
        };
        LEVEL_NAMES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, level)| *level)
            .ok_or_else(|| format!("unknown log level {:?}", s))
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Off => LevelFilter::OFF,
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Timestamps on human output. JSONL always carries `ts`.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Info,
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Resolve from the process environment plus CLI overrides.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), cli_level, cli_format)
    }

    /// Resolve with `lookup` standing in for the environment.
    ///
    /// Unparseable values are ignored rather than rejected, so a typo in a
    /// cron environment never stops a collection run.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        cli_level: Option<LogLevel>,
        cli_format: Option<LogFormat>,
    ) -> Self {
        let mut config = LogConfig::default();

        let env_level = match lookup(ENV_LOG) {
            Some(val) => val.parse().ok(),
            None => lookup("RUST_LOG").and_then(|val| LogLevel::from_rust_log(&val)),
        };
        if let Some(level) = env_level {
            config.level = level;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT).and_then(|val| val.parse().ok()) {
            config.format = format;
        }
        if let Some(val) = lookup(ENV_LOG_TIMESTAMPS) {
            config.timestamps = !matches!(val.trim(), "0" | "false" | "no" | "off");
        }

        if let Some(level) = cli_level {
            config.level = level;
        }
        if let Some(format) = cli_format {
            config.format = format;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("human".parse::<LogFormat>().unwrap(), LogFormat::Human);
        assert_eq!(" JSONL ".parse::<LogFormat>().unwrap(), LogFormat::Jsonl);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Jsonl);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_log_level_parse_and_display() {
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert_eq!("Warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("quiet".parse::<LogLevel>().unwrap(), LogLevel::Off);
        assert!("loud".parse::<LogLevel>().is_err());
        for (name, level) in LEVEL_NAMES {
            assert_eq!(level.to_string(), name);
        }
    }

    #[test]
    fn test_verbosity_steps() {
        assert_eq!(LogLevel::from_verbosity(0, 0), LogLevel::Info);
        assert_eq!(LogLevel::from_verbosity(1, 0), LogLevel::Debug);
        assert_eq!(LogLevel::from_verbosity(3, 0), LogLevel::Trace);
        assert_eq!(LogLevel::from_verbosity(0, 1), LogLevel::Warn);
        assert_eq!(LogLevel::from_verbosity(0, 2), LogLevel::Error);
        assert_eq!(LogLevel::from_verbosity(0, 200), LogLevel::Off);
        assert_eq!(LogLevel::from_verbosity(1, 1), LogLevel::Info);
    }

    #[test]
    fn test_rust_log_directives() {
        assert_eq!(LogLevel::from_rust_log("debug"), Some(LogLevel::Debug));
        assert_eq!(
            LogLevel::from_rust_log("hyper=trace,burnrate=warn"),
            Some(LogLevel::Warn)
        );
        assert_eq!(LogLevel::from_rust_log("hyper=trace"), None);
    }

    #[test]
    fn test_env_precedence() {
        let config = LogConfig::from_lookup(
            env(&[("BURNRATE_LOG", "error"), ("RUST_LOG", "trace")]),
            None,
            None,
        );
        assert_eq!(config.level, LogLevel::Error);

        let config = LogConfig::from_lookup(env(&[("RUST_LOG", "debug")]), None, None);
        assert_eq!(config.level, LogLevel::Debug);

        let config = LogConfig::from_lookup(
            env(&[
                ("BURNRATE_LOG", "debug"),
                ("BURNRATE_LOG_FORMAT", "jsonl"),
                ("BURNRATE_LOG_TIMESTAMPS", "0"),
            ]),
            Some(LogLevel::Warn),
            Some(LogFormat::Human),
        );
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, LogFormat::Human);
        assert!(!config.timestamps);
    }

    #[test]
    fn test_bad_env_values_keep_defaults() {
        let config = LogConfig::from_lookup(
            env(&[("BURNRATE_LOG", "chatty"), ("BURNRATE_LOG_FORMAT", "xml")]),
            None,
            None,
        );
        assert_eq!(config, LogConfig::default());
    }
}
