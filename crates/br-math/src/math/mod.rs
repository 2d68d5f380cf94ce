//! Core math modules.

pub mod overlap;
pub mod scaled;
