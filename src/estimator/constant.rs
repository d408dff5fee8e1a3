//! Estimator that predicts one fixed effect for every unit.

use nalgebra::DMatrix;

use super::{EffectEstimator, EffectModel, FitData, FitError};

/// Predicts `effect` for every unit, ignoring the training data.
///
/// Useful as a deterministic stand-in for a real estimator when checking the
/// decomposition algebra.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantEstimator {
    /// The effect predicted for every unit.
    pub effect: f64,
}

impl ConstantEstimator {
    /// Estimator predicting `effect`.
    pub fn new(effect: f64) -> Self {
        Self { effect }
    }
}

/// Fitted [`ConstantEstimator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantModel {
    effect: f64,
    rows: usize,
}

impl EffectEstimator for ConstantEstimator {
    type Model = ConstantModel;

    fn fit(&self, data: &FitData<'_>) -> Result<ConstantModel, FitError> {
        data.check_shapes()?;
        Ok(ConstantModel {
            effect: self.effect,
            rows: data.n_rows(),
        })
    }
}

impl EffectModel for ConstantModel {
    fn predict_out_of_sample(&self, features: &DMatrix<f64>) -> Result<Vec<f64>, FitError> {
        if features.nrows() != self.rows {
            return Err(FitError::FeatureMismatch {
                expected: self.rows,
                got: features.nrows(),
            });
        }
        Ok(vec![self.effect; self.rows])
    }
}
