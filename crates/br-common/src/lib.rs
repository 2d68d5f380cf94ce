//! Burn rate common types, IDs, and errors.
//!
//! This crate provides foundational types shared across br-core modules:
//! - Entity and group identity types
//! - Decimal `u128` amounts and their serde adapters
//! - Lookback window parsing
//! - Common error types
//! - Output format specifications

pub mod amount;
pub mod error;
pub mod id;
pub mod output;
pub mod window;

pub use amount::Amount;
pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use id::{EntityId, GroupName};
pub use output::OutputFormat;
pub use window::{parse_window, MS_PER_DAY, MS_PER_HOUR};
