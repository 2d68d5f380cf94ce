//! Burn Rate Core Library
//!
//! This library provides the core functionality for burn rate tracking:
//! - The estimation engine (intervals, top-up inference, rates, rollups)
//! - Snapshot log and registry storage behind a shared data context
//! - Balance collection with batching, timeouts, and fallback
//! - Leaderboard, detail, and stats reports
//! - Configuration loading, logging, and exit codes
//!
//! The binary entry point is in `main.rs`.

pub mod burn;
pub mod collect;
pub mod config;
pub mod exit_codes;
pub mod logging;
pub mod report;
pub mod store;
