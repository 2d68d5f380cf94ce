//! Balance collection.
//!
//! One collection cycle queries every valid registry entity through a
//! [`BalanceSource`], builds one [`Snapshot`](crate::store::Snapshot), and
//! prepends it to the log. Failed calls never fail the cycle: the entity
//! falls back to its value in the previous snapshot, or is left out.

pub mod collector;
pub mod source;

pub use collector::{CollectionReport, Collector};
pub use source::FileBalanceSource;

use br_common::{Amount, EntityId};
use std::collections::HashMap;
use thiserror::Error;

/// Per-call collection failures.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("proxy {proxy} failed: {message}")]
    Proxy { proxy: String, message: String },

    #[error("entity {entity_id} missing from {proxy} summary")]
    MissingFromSummary { proxy: String, entity_id: EntityId },

    #[error("balance source unavailable: {0}")]
    Source(String),
}

impl From<CollectError> for br_common::Error {
    fn from(err: CollectError) -> Self {
        br_common::Error::Collection(err.to_string())
    }
}

/// Where balances come from.
///
/// Implementations may block; the collector bounds every call with its
/// configured timeout.
pub trait BalanceSource: Send + Sync {
    /// Balance of one entity behind a status proxy.
    fn query_status(&self, proxy: &str, entity: &EntityId) -> Result<Amount, CollectError>;

    /// Balances of every entity a summary proxy fronts.
    fn query_summary(&self, proxy: &str) -> Result<HashMap<EntityId, Amount>, CollectError>;
}
