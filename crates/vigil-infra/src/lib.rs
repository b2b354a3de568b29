//! Vigil Infrastructure Library
//!
//! Process-level plumbing shared by Vigil binaries.

pub mod telemetry;

pub use telemetry::{init_telemetry, DEFAULT_FILTER};
