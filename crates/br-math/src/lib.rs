//! Burn rate math utilities.

pub mod math;

pub use math::overlap::*;
pub use math::scaled::*;
