//! Structured event definitions for logging.
//!
//! Events follow one schema for machine-parseable JSONL output. Every
//! event carries the run id and the pipeline stage that emitted it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Loading snapshots and the registry from disk.
    Load,
    /// Querying balances and appending a snapshot.
    Collect,
    /// Per-entity interval analysis and rate estimation.
    Estimate,
    /// Group rollups.
    Aggregate,
    /// Leaderboards, detail views and rendering.
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Load => "load",
            Stage::Collect => "collect",
            Stage::Estimate => "estimate",
            Stage::Aggregate => "aggregate",
            Stage::Report => "report",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names, used as tracing targets.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Load stage
    pub const DATASET_LOADED: &str = "load.dataset_loaded";
    pub const DATASET_INVALIDATED: &str = "load.dataset_invalidated";
    pub const STORE_SAVED: &str = "load.store_saved";

    // Collect stage
    pub const COLLECT_STARTED: &str = "collect.started";
    pub const COLLECT_ENTITY_FAILED: &str = "collect.entity_failed";
    pub const COLLECT_PROXY_FAILED: &str = "collect.proxy_failed";
    pub const COLLECT_EVICTED: &str = "collect.evicted";
    pub const COLLECT_FINISHED: &str = "collect.finished";
    pub const COLLECT_SCHEDULED: &str = "collect.scheduled";
    pub const COLLECT_CYCLE_FAILED: &str = "collect.cycle_failed";

    // Estimate stage
    pub const ESTIMATE_INTERVALS: &str = "estimate.intervals";
    pub const ESTIMATE_INSUFFICIENT: &str = "estimate.insufficient_points";
    pub const ESTIMATE_DONE: &str = "estimate.done";

    // Aggregate stage
    pub const AGGREGATE_DONE: &str = "aggregate.done";

    // Registry administration
    pub const REGISTRY_IMPORTED: &str = "registry.imported";
    pub const REGISTRY_REMOVED: &str = "registry.removed";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// A structured log event for JSONL output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub ts: DateTime<Utc>,
    pub level: Level,

    /// Event name (e.g., "collect.started").
    pub event: String,

    /// Unique ID for this invocation.
    pub run_id: String,

    pub stage: Stage,
    pub message: String,

    /// Entity the event concerns, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    /// Additional structured fields (stable keys).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, serde_json::Value>,
}

impl LogEvent {
    pub fn new(
        level: Level,
        event: impl Into<String>,
        run_id: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
    ) -> Self {
        LogEvent {
            ts: Utc::now(),
            level,
            event: event.into(),
            run_id: run_id.into(),
            stage,
            message: message.into(),
            entity_id: None,
            fields: HashMap::new(),
        }
    }

    pub fn with_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Add a field to the event.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key.into(), v);
        }
        self
    }
}

/// Context for generating log events with a consistent run ID.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
        }
    }

    /// Context with a freshly generated run ID.
    pub fn fresh() -> Self {
        LogContext::new(super::generate_run_id())
    }

    pub fn event(
        &self,
        level: Level,
        event: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
    ) -> LogEvent {
        LogEvent::new(level, event, &self.run_id, stage, message)
    }

    pub fn info(&self, event: impl Into<String>, stage: Stage, message: impl Into<String>) -> LogEvent {
        self.event(Level::Info, event, stage, message)
    }

    pub fn warn(&self, event: impl Into<String>, stage: Stage, message: impl Into<String>) -> LogEvent {
        self.event(Level::Warn, event, stage, message)
    }
}
