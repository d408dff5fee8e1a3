//! Error types for decomposition runs.
//!
//! Configuration and data problems are reported before any resampling starts.
//! Problems confined to one outer replicate are [`ReplicateError`]s and are
//! handled by the configured [`FailurePolicy`](crate::FailurePolicy).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Method;
use crate::data::DataError;
use crate::estimator::FitError;
use crate::result::ReplicateFailure;

/// Top-level error returned by the decomposition driver.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// The dataset does not match the requested variables.
    #[error("data error: {0}")]
    Data(#[from] DataError),

    /// The decomposition method is recognised but not implemented.
    #[error("unsupported decomposition method: {0:?}")]
    UnsupportedMethod(Method),

    /// An outer replicate failed under the fail-fast policy.
    #[error("replicate {rep} failed: {source}")]
    Replicate {
        /// Outer replicate index.
        rep: usize,
        /// What went wrong.
        #[source]
        source: ReplicateError,
    },

    /// Every outer replicate failed, so there is nothing to summarise.
    #[error("all {attempted} outer replicates failed{}", first_cause(.failures))]
    AllReplicatesFailed {
        /// Number of replicates attempted.
        attempted: usize,
        /// Why each replicate failed, in replicate order.
        failures: Vec<ReplicateFailure>,
    },
}

fn first_cause(failures: &[ReplicateFailure]) -> String {
    failures
        .first()
        .map(|f| format!(" (replicate {}: {})", f.rep, f.error))
        .unwrap_or_default()
}

/// Failure local to one outer replicate.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicateError {
    /// The outer bootstrap sample has no rows at one attribute level.
    #[error("outer sample has no rows at level {level} ({rows} rows drawn)")]
    DegenerateSample {
        /// The missing level, rendered for display.
        level: String,
        /// Size of the outer sample.
        rows: usize,
    },

    /// The effect estimator could not be fitted or queried.
    #[error("estimator failed: {0}")]
    Fit(#[from] FitError),

    /// The estimator returned the wrong number of predictions.
    #[error("estimator returned {got} predictions for {expected} rows")]
    PredictionLength {
        /// Rows in the outer sample.
        expected: usize,
        /// Predictions returned.
        got: usize,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
