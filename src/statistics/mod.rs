//! Statistical machinery for the decomposition engine.
//!
//! This module provides:
//! - Two-level bootstrap resampling with per-replicate deterministic seeding
//! - Aggregation of per-unit arrays into group-conditional mean measures
//! - Welford-based summaries of measures across all bootstrap rows

mod aggregate;
mod resample;
mod summary;

pub use aggregate::{measure_one, measure_three, measure_two, nan_mean, Term};
pub use resample::{counter_rng_seed, outer_bootstrap_rows, replicate_rng, BootstrapIndexSet};
pub use summary::{summarize, Welford};
