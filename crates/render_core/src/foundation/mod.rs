//! Foundational utilities shared across the crate

pub mod hash;
pub mod logging;
pub mod math;
