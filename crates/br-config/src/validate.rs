//! Semantic validation of engine configuration.

use thiserror::Error;

use crate::engine::EngineConfig;

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

/// Validate engine configuration semantically.
pub fn validate_config(config: &EngineConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    let w = &config.windows;
    positive("windows.short_ms", w.short_ms)?;
    positive("windows.day_ms", w.day_ms)?;
    positive("windows.week_ms", w.week_ms)?;
    positive("windows.month_ms", w.month_ms)?;
    positive("windows.chart_ms", w.chart_ms)?;

    if !(w.short_ms <= w.day_ms && w.day_ms <= w.week_ms && w.week_ms <= w.month_ms) {
        return Err(ValidationError::SemanticError(format!(
            "Windows must be ordered short <= day <= week <= month, got {} / {} / {} / {}",
            w.short_ms, w.day_ms, w.week_ms, w.month_ms
        )));
    }

    if config.retention.max_snapshots == 0 {
        return Err(ValidationError::InvalidValue {
            field: "retention.max_snapshots".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }

    if let Some(age) = config.retention.max_age_ms {
        positive("retention.max_age_ms", age)?;
    }

    if config.collector.batch_size == 0 {
        return Err(ValidationError::InvalidValue {
            field: "collector.batch_size".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }

    if config.collector.call_timeout_ms == 0 {
        return Err(ValidationError::InvalidValue {
            field: "collector.call_timeout_ms".to_string(),
            message: "Must be positive".to_string(),
        });
    }

    if config.report.max_page_size == 0 {
        return Err(ValidationError::InvalidValue {
            field: "report.max_page_size".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }

    Ok(())
}

fn positive(field: &str, value: i64) -> ValidationResult<()> {
    if value <= 0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be positive, got {}", value),
        });
    }
    Ok(())
}
