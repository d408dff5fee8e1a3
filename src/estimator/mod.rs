//! Heterogeneous treatment-effect estimators.
//!
//! The decomposition engine treats the estimator as a black box: it fits on
//! features, a binary treatment and an outcome, and returns one out-of-sample
//! effect prediction per training unit. Any type implementing
//! [`EffectEstimator`] can be plugged into
//! [`FairnessCookbook`](crate::FairnessCookbook); the forest settings in
//! [`ForestParams`] are forwarded to every fit unchanged.
//!
//! Two estimators ship with the crate:
//! - [`LinearTLearner`]: cross-fitted linear T-learner
//! - [`ConstantEstimator`]: predicts one fixed effect, for tests and baselines

mod constant;
mod linear;

pub use constant::{ConstantEstimator, ConstantModel};
pub use linear::{LinearTLearner, LinearTModel};

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Error, Result};

/// Errors raised while fitting or querying an estimator.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitError {
    /// Training data lacks one of the treatment arms.
    #[error("degenerate treatment assignment: {treated} treated, {control} control units")]
    DegenerateTreatment {
        /// Treated units available.
        treated: usize,
        /// Control units available.
        control: usize,
    },

    /// Too few rows to fit.
    #[error("need at least {required} rows, got {rows}")]
    InsufficientRows {
        /// Rows available.
        rows: usize,
        /// Rows required.
        required: usize,
    },

    /// A linear system had no solution.
    #[error("singular system while fitting")]
    Singular,

    /// Inputs disagree on shape.
    #[error("shape mismatch: expected {expected}, got {got}")]
    FeatureMismatch {
        /// Expected size.
        expected: usize,
        /// Received size.
        got: usize,
    },

    /// A feature value is NaN or infinite.
    #[error("non-finite feature value at row {row}, column {column}")]
    NonFiniteFeature {
        /// Row within the fitted sample.
        row: usize,
        /// Feature column.
        column: usize,
    },

    /// Estimator-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Training data for one fit.
#[derive(Debug, Clone, Copy)]
pub struct FitData<'a> {
    /// One row per unit, one column per feature.
    pub features: &'a DMatrix<f64>,
    /// `false` for units at `x0`, `true` otherwise.
    pub treatment: &'a [bool],
    /// Outcome per unit.
    pub outcome: &'a [f64],
    /// Forest configuration, passed through.
    pub params: &'a ForestParams,
    /// Seed for any randomness inside the estimator.
    pub seed: u64,
}

impl FitData<'_> {
    /// Number of training units.
    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    /// Check that every input has one entry per feature row.
    pub fn check_shapes(&self) -> std::result::Result<(), FitError> {
        let n = self.n_rows();
        for got in [self.treatment.len(), self.outcome.len()] {
            if got != n {
                return Err(FitError::FeatureMismatch { expected: n, got });
            }
        }
        Ok(())
    }

    /// `(treated, control)` unit counts.
    pub fn arm_counts(&self) -> (usize, usize) {
        let treated = self.treatment.iter().filter(|&&t| t).count();
        (treated, self.treatment.len() - treated)
    }
}

/// Fits a heterogeneous treatment-effect model.
///
/// `Sync` because one estimator instance serves every outer replicate,
/// possibly from several threads at once.
pub trait EffectEstimator: Send + Sync {
    /// Fitted model type.
    type Model: EffectModel;

    /// Fit on one outer bootstrap sample.
    fn fit(&self, data: &FitData<'_>) -> std::result::Result<Self::Model, FitError>;
}

/// A fitted effect model.
pub trait EffectModel {
    /// Per-unit effect predictions for the training units, each made without
    /// using that unit to shape its own prediction.
    ///
    /// `features` are the training features in training order.
    fn predict_out_of_sample(&self, features: &DMatrix<f64>) -> std::result::Result<Vec<f64>, FitError>;
}

/// Causal forest configuration.
///
/// None of these values are interpreted by the decomposition engine. The
/// defaults follow the R `grf::causal_forest` settings as closely as the
/// options allow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees (default: 100).
    pub n_estimators: usize,
    /// Split quality criterion (default: heterogeneity score).
    pub criterion: SplitCriterion,
    /// Minimum samples in a leaf (default: 5).
    pub min_samples_leaf: usize,
    /// Features considered per split (default: square root).
    pub max_features: MaxFeatures,
    /// Grow trees on one half of the subsample and estimate leaves on the
    /// other (default: true).
    pub honest: bool,
    /// Fraction of rows subsampled per tree, in (0, 1] (default: 0.5).
    pub max_samples: f64,
    /// Minimum samples to split a node (default: 2).
    pub min_samples_split: usize,
    /// Tolerated split imbalance, in [0, 0.5] (default: 0.45).
    pub min_balancedness_tol: f64,
    /// Enable confidence interval construction (default: false).
    pub inference: bool,
}

/// Split quality criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitCriterion {
    /// Mean squared error of the linear moment.
    Mse,
    /// Heterogeneity score.
    Het,
}

/// Number of features considered per split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// All features.
    Auto,
    /// `ceil(sqrt(p))`.
    Sqrt,
    /// `ceil(log2(p))`.
    Log2,
    /// All features.
    All,
    /// A fixed number.
    Count(usize),
    /// A fraction of `p` in (0, 1].
    Fraction(f64),
}

impl MaxFeatures {
    /// Features to consider when `p` are available (at least 1, at most `p`).
    pub fn resolve(&self, p: usize) -> usize {
        let k = match *self {
            MaxFeatures::Auto | MaxFeatures::All => p,
            MaxFeatures::Sqrt => (p as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (p as f64).log2().ceil() as usize,
            MaxFeatures::Count(k) => k,
            MaxFeatures::Fraction(f) => (f * p as f64).ceil() as usize,
        };
        k.clamp(1, p.max(1))
    }
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            criterion: SplitCriterion::Het,
            min_samples_leaf: 5,
            max_features: MaxFeatures::Sqrt,
            honest: true,
            max_samples: 0.5,
            min_samples_split: 2,
            min_balancedness_tol: 0.45,
            inference: false,
        }
    }
}

impl ForestParams {
    /// Reject out-of-range settings.
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(Error::Config("n_estimators must be at least 1".into()));
        }
        if self.min_samples_leaf == 0 {
            return Err(Error::Config("min_samples_leaf must be at least 1".into()));
        }
        if self.min_samples_split < 2 {
            return Err(Error::Config("min_samples_split must be at least 2".into()));
        }
        if !(self.max_samples > 0.0 && self.max_samples <= 1.0) {
            return Err(Error::Config(format!(
                "max_samples must be in (0, 1], got {}",
                self.max_samples
            )));
        }
        if !(0.0..=0.5).contains(&self.min_balancedness_tol) {
            return Err(Error::Config(format!(
                "min_balancedness_tol must be in [0, 0.5], got {}",
                self.min_balancedness_tol
            )));
        }
        match self.max_features {
            MaxFeatures::Count(0) => {
                return Err(Error::Config("max_features count must be at least 1".into()))
            }
            MaxFeatures::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                return Err(Error::Config(format!(
                    "max_features fraction must be in (0, 1], got {}",
                    f
                )))
            }
            _ => {}
        }
        Ok(())
    }
}
