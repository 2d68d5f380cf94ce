//! Error types for burn rate tracking.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//!
//! # Agent-Facing Output
//!
//! Errors serialize to structured JSON:
//! ```json
//! {
//!   "code": 21,
//!   "category": "data",
//!   "message": "entity not found: ryjl3-tyaaa-aaaaa-aaaba-cai",
//!   "recoverable": false,
//!   "context": { "entity_id": "ryjl3-tyaaa-aaaaa-aaaba-cai" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for burn rate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors.
    Config,
    /// Snapshot log and query errors.
    Data,
    /// Entity registry errors.
    Registry,
    /// Balance collection errors.
    Collection,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Data => write!(f, "data"),
            ErrorCategory::Registry => write!(f, "registry"),
            ErrorCategory::Collection => write!(f, "collection"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for burn rate tracking.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid window: {0:?} (expected e.g. 30m, 1h, 24h, 7d)")]
    InvalidWindow(String),

    // Data errors (20-29)
    #[error("snapshot log is empty")]
    EmptyLog,

    #[error("entity not found: {entity_id}")]
    EntityNotFound { entity_id: String },

    #[error("group not found: {group}")]
    GroupNotFound { group: String },

    #[error("snapshot log corrupted: {0}")]
    CorruptLog(String),

    // Registry errors (30-39)
    #[error("invalid registry record: {0}")]
    InvalidRecord(String),

    // Collection errors (40-49)
    #[error("balance collection failed: {0}")]
    Collection(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Data errors
    /// - 30-39: Registry errors
    /// - 40-49: Collection errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidWindow(_) => 11,
            Error::EmptyLog => 20,
            Error::EntityNotFound { .. } => 21,
            Error::GroupNotFound { .. } => 22,
            Error::CorruptLog(_) => 23,
            Error::InvalidRecord(_) => 30,
            Error::Collection(_) => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidWindow(_) => ErrorCategory::Config,
            Error::EmptyLog
            | Error::EntityNotFound { .. }
            | Error::GroupNotFound { .. }
            | Error::CorruptLog(_) => ErrorCategory::Data,
            Error::InvalidRecord(_) => ErrorCategory::Registry,
            Error::Collection(_) => ErrorCategory::Collection,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::InvalidWindow(_) => true,
            // Nothing collected yet; the next collection cycle fixes it.
            Error::EmptyLog => true,
            Error::EntityNotFound { .. } => false,
            Error::GroupNotFound { .. } => false,
            Error::CorruptLog(_) => false,
            Error::InvalidRecord(_) => true,
            Error::Collection(_) => true,
            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'burnrate config validate' to check the configuration file."
            }
            Error::InvalidWindow(_) => "Use a window such as 30m, 1h, 24h, 7d, or raw milliseconds.",
            Error::EmptyLog => "Run 'burnrate collect' at least twice before querying rates.",
            Error::EntityNotFound { .. } => {
                "Check the entity id with 'burnrate registry export'."
            }
            Error::GroupNotFound { .. } => "List known groups with 'burnrate groups'.",
            Error::CorruptLog(_) => {
                "The snapshot log failed validation. Restore snapshots.json from backup."
            }
            Error::InvalidRecord(_) => "Fix the registry import file and retry.",
            Error::Collection(_) => "Retry the collection cycle; failed entities fall back to their last value.",
            Error::Io(_) => "Check disk space, permissions, and that the data directory exists.",
            Error::Json(_) => "Invalid JSON in file. Check syntax or restore from backup.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidWindow(_) => "Invalid Window",
            Error::EmptyLog => "No Snapshots",
            Error::EntityNotFound { .. } => "Entity Not Found",
            Error::GroupNotFound { .. } => "Group Not Found",
            Error::CorruptLog(_) => "Snapshot Log Corrupted",
            Error::InvalidRecord(_) => "Invalid Registry Record",
            Error::Collection(_) => "Collection Error",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }

    /// Format for terminal output: headline, reason, fix.
    pub fn to_human(&self) -> String {
        format!(
            "✗ {}\n  Reason: {}\n  Fix: {}",
            self.headline(),
            self,
            self.remediation()
        )
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (e.g., entity id, group).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::EntityNotFound { entity_id } => {
                context.insert("entity_id".to_string(), serde_json::json!(entity_id));
            }
            Error::GroupNotFound { group } => {
                context.insert("group".to_string(), serde_json::json!(group));
            }
            Error::InvalidWindow(w) => {
                context.insert("window".to_string(), serde_json::json!(w));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}
