//! Rendering of decomposition results.
//!
//! - [`json`]: serde_json serialization of a full [`Decomposition`](crate::Decomposition)
//! - [`terminal`]: colored summary table for humans

pub mod json;
pub mod terminal;

pub use json::{to_json, to_json_pretty};
pub use terminal::format_summary;
