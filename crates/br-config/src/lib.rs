//! Burn rate configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for burnrate.json
//! - Config resolution (CLI → env → XDG → system → defaults)
//! - Data directory resolution
//! - Semantic validation

pub mod engine;
pub mod resolve;
pub mod validate;

pub use engine::{
    CollectorSettings, EngineConfig, RegistrySettings, ReportSettings, RetentionSettings,
    WindowSettings,
};
pub use resolve::{resolve_config, resolve_data_dir, ConfigPaths, ConfigSource};
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
