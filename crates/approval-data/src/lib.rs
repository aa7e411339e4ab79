//! approval-data crate
//!
//! Transaction trace model consumed by the approval analyzer, plus
//! helpers for loading detection requests from disk.

pub mod loader;
pub mod types;

pub use types::{Call, DetectionRequest, Log, Trace};
