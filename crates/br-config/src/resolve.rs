//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI arguments → environment variables → XDG paths → defaults.

use std::path::{Path, PathBuf};

/// Discovered configuration and data paths.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Path to burnrate.json (or None if not found).
    pub config: Option<PathBuf>,

    /// Source of the config file (for diagnostics).
    pub config_source: ConfigSource,
}

/// Where a configuration file was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/burnrate/.
    SystemConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

pub const ENV_CONFIG_PATH: &str = "BURNRATE_CONFIG";
pub const ENV_CONFIG_DIR: &str = "BURNRATE_CONFIG_DIR";
pub const ENV_DATA_DIR: &str = "BURNRATE_DATA_DIR";

pub const CONFIG_FILENAME: &str = "burnrate.json";

/// Application name for XDG directories.
const APP_NAME: &str = "burnrate";

/// Resolve the configuration file path.
///
/// 1. Explicit CLI path (if it exists)
/// 2. BURNRATE_CONFIG environment variable
/// 3. BURNRATE_CONFIG_DIR environment variable + burnrate.json
/// 4. XDG config directory (~/.config/burnrate/)
/// 5. System config (/etc/burnrate/)
/// 6. Built-in defaults (None)
pub fn resolve_config(cli_path: Option<&Path>) -> ConfigPaths {
    let mut paths = ConfigPaths::default();

    if let Some(path) = cli_path {
        if path.exists() {
            paths.config = Some(path.to_path_buf());
            paths.config_source = ConfigSource::CliArgument;
            return paths;
        }
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            paths.config = Some(path);
            paths.config_source = ConfigSource::Environment;
            return paths;
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(CONFIG_FILENAME);
        if path.exists() {
            paths.config = Some(path);
            paths.config_source = ConfigSource::Environment;
            return paths;
        }
    }

    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(CONFIG_FILENAME);
        if path.exists() {
            paths.config = Some(path);
            paths.config_source = ConfigSource::XdgConfig;
            return paths;
        }
    }

    let system_path = system_config_dir().join(CONFIG_FILENAME);
    if system_path.exists() {
        paths.config = Some(system_path);
        paths.config_source = ConfigSource::SystemConfig;
        return paths;
    }

    paths
}

/// Resolve the data directory holding snapshots.json and registry.json.
///
/// CLI argument wins, then BURNRATE_DATA_DIR, then the XDG data directory.
/// Falls back to `./.burnrate` when no home directory can be determined.
pub fn resolve_data_dir(cli_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = cli_dir {
        return dir.to_path_buf();
    }

    if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    dirs::data_dir()
        .map(|d| d.join(APP_NAME))
        .unwrap_or_else(|| PathBuf::from(".burnrate"))
}

/// Get the XDG config directory for burnrate.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::CliArgument), "CLI argument");
        assert_eq!(
            format!("{}", ConfigSource::Environment),
            "environment variable"
        );
        assert_eq!(format!("{}", ConfigSource::XdgConfig), "XDG config");
        assert_eq!(format!("{}", ConfigSource::SystemConfig), "system config");
        assert_eq!(
            format!("{}", ConfigSource::BuiltinDefault),
            "builtin default"
        );
    }

    #[test]
    fn test_system_config_dir() {
        assert_eq!(system_config_dir(), PathBuf::from("/etc/burnrate"));
    }

    #[test]
    fn test_cli_data_dir_wins() {
        let dir = resolve_data_dir(Some(Path::new("/tmp/br-data")));
        assert_eq!(dir, PathBuf::from("/tmp/br-data"));
    }
}
