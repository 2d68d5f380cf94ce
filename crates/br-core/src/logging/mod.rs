//! Structured logging for burnrate.
//!
//! Provides dual-mode logging:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSONL for scheduled collection and agents
//!
//! # Usage
//!
//! ```ignore
//! use br_core::logging::{init_logging, LogConfig, LogContext, Stage, event_names};
//!
//! let config = LogConfig::from_env(None, None);
//! init_logging(&config);
//!
//! let ctx = LogContext::fresh();
//! let span = tracing::info_span!("run", run_id = %ctx.run_id, stage = %Stage::Collect);
//! let _enter = span.enter();
//! tracing::info!(target: event_names::COLLECT_STARTED, entities = 12u64, "collecting");
//! ```
//!
//! stdout is reserved for command payloads; all log output goes to stderr.

pub mod config;
pub mod events;
pub mod layer;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Level, LogContext, LogEvent, Stage};
pub use layer::JsonlLayer;

use std::io::IsTerminal;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the logging subsystem.
///
/// Call once at startup. A second call is a no-op. `RUST_LOG` directives,
/// when present, replace the configured level.
pub fn init_logging(config: &LogConfig) {
    // Event names are used as targets, so filter on level rather than crate.
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(config.level).into())
        .from_env_lossy();

    let result = match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => tracing_subscriber::registry()
            .with(filter)
            .with(JsonlLayer::stderr())
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("logging already initialized");
    }
}

/// Generate a unique run ID for this invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("run-{}", &uuid[..12])
}

/// Emit a prepared [`LogEvent`] through tracing at its own level.
pub fn emit(event: &LogEvent) {
    let fields = serde_json::to_string(&event.fields).unwrap_or_default();
    let entity = event.entity_id.as_deref();
    match event.level {
        Level::Trace => tracing::trace!(run_id = %event.run_id, stage = %event.stage, event = %event.event, entity_id = entity, fields = %fields, "{}", event.message),
        Level::Debug => tracing::debug!(run_id = %event.run_id, stage = %event.stage, event = %event.event, entity_id = entity, fields = %fields, "{}", event.message),
        Level::Info => tracing::info!(run_id = %event.run_id, stage = %event.stage, event = %event.event, entity_id = entity, fields = %fields, "{}", event.message),
        Level::Warn => tracing::warn!(run_id = %event.run_id, stage = %event.stage, event = %event.event, entity_id = entity, fields = %fields, "{}", event.message),
        Level::Error => tracing::error!(run_id = %event.run_id, stage = %event.stage, event = %event.event, entity_id = entity, fields = %fields, "{}", event.message),
    }
}
