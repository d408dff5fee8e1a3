//! # fairness-cookbook
//!
//! Causal decomposition of outcome disparities with nested bootstrap
//! uncertainty.
//!
//! Given a binary protected attribute `X`, an outcome `Y`, mediators `Z` and
//! confounders `W`, this crate splits the observed gap
//! `E[Y | x1] - E[Y | x0]` (the total variation, `tv`) into direct, indirect
//! and spurious components, outputting:
//! - One value per measure for every (outer replicate, inner replicate) pair
//! - A mean and standard deviation per measure across all of those values
//! - Provenance of each value: estimated, copied, or a placeholder
//!
//! ## How It Works
//!
//! An effect estimator (anything implementing
//! [`EffectEstimator`](estimator::EffectEstimator)) is fitted once per outer
//! bootstrap replicate on the mediators, and once on mediators plus
//! confounders. Its out-of-sample per-unit effect predictions are then
//! averaged over many cheap inner bootstrap draws, split by attribute level.
//! Replicate 0 uses the original rows, so its first inner value of `tv` is
//! the raw group-mean difference.
//!
//! With the reverse-transition sign convention used here the total effect
//! splits as `te = nde - nie`.
//!
//! ## Quick Start
//!
//! ```
//! use fairness_cookbook::{FairnessCookbook, Measure};
//! use fairness_cookbook::data::{Dataset, Variables};
//! use fairness_cookbook::estimator::ConstantEstimator;
//!
//! let data = Dataset::new()
//!     .with_categorical("x", ["a", "b", "a", "b", "a", "b"])?
//!     .with_numeric("y", vec![1.0, 2.0, 1.5, 2.5, 0.5, 3.0])?;
//! let vars = Variables::new("x", "y", "a", "b");
//!
//! let result = FairnessCookbook::new(ConstantEstimator::new(0.0))
//!     .nboot2(1)
//!     .seed(1)
//!     .decompose(&data, &vars)?;
//!
//! // No mediators and no confounders: te coincides with tv.
//! assert!((result.mean(Measure::Tv) - 1.5).abs() < 1e-12);
//! assert_eq!(result.mean(Measure::Te), result.mean(Measure::Tv));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod cookbook;
mod error;
mod result;
mod types;

// Functional modules
pub mod analysis;
pub mod data;
pub mod estimator;
pub mod output;
pub mod statistics;
pub mod thread_pool;

// Re-exports for public API
pub use analysis::DecompositionPlan;
pub use config::{Config, FailurePolicy, Method};
pub use cookbook::{fairness_cookbook, FairnessCookbook};
pub use error::{Error, ReplicateError, Result};
pub use result::{
    Decomposition, EffectRow, EffectTable, MeasureSummary, MeasureTable, Metadata,
    ReplicateEffects, ReplicateFailure, ValueOrigin,
};
pub use types::{IndexSubset, Measure};
