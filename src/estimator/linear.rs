//! Cross-fitted linear T-learner.
//!
//! Fits separate ridge regressions of the outcome on `[1, features]` for the
//! treated and control units and predicts `mu1(x) - mu0(x)`. Units are split
//! into folds; each unit's effect comes from the pair of regressions trained
//! without its fold, so predictions for the training units are out-of-sample.

use nalgebra::{Cholesky, DMatrix, DVector};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use super::{EffectEstimator, EffectModel, FitData, FitError};

/// Linear T-learner with `folds`-way cross-fitting.
#[derive(Debug, Clone)]
pub struct LinearTLearner {
    folds: usize,
    ridge: f64,
}

impl Default for LinearTLearner {
    fn default() -> Self {
        Self {
            folds: 2,
            ridge: 1e-6,
        }
    }
}

impl LinearTLearner {
    /// Two folds, tiny ridge penalty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cross-fitting folds. `1` fits and predicts in-sample.
    pub fn folds(mut self, folds: usize) -> Self {
        self.folds = folds.max(1);
        self
    }

    /// Ridge penalty on the slopes (the intercept is not penalised).
    pub fn ridge(mut self, lambda: f64) -> Self {
        self.ridge = lambda.max(0.0);
        self
    }
}

/// Fitted [`LinearTLearner`].
#[derive(Debug, Clone)]
pub struct LinearTModel {
    fold_of: Vec<usize>,
    /// `treated - control` coefficients per fold, intercept first.
    contrasts: Vec<DVector<f64>>,
}

impl EffectEstimator for LinearTLearner {
    type Model = LinearTModel;

    fn fit(&self, data: &FitData<'_>) -> Result<LinearTModel, FitError> {
        data.check_shapes()?;
        let n = data.n_rows();
        let (treated, control) = data.arm_counts();
        if treated == 0 || control == 0 {
            return Err(FitError::DegenerateTreatment { treated, control });
        }

        if let Some((row, column)) = first_non_finite(data.features) {
            return Err(FitError::NonFiniteFeature { row, column });
        }

        tracing::trace!(
            n_estimators = data.params.n_estimators,
            max_features = data.params.max_features.resolve(data.features.ncols()),
            honest = data.params.honest,
            "linear T-learner does not use forest parameters"
        );

        let folds = self.folds.min(n);
        let fold_of = assign_folds(n, folds, data.seed);

        let mut contrasts = Vec::with_capacity(folds);
        for fold in 0..folds {
            let in_training = |i: usize| folds == 1 || fold_of[i] != fold;
            let arm_rows = |arm: bool| -> Vec<usize> {
                (0..n)
                    .filter(|&i| in_training(i) && data.treatment[i] == arm)
                    .collect()
            };
            let rows1 = arm_rows(true);
            let rows0 = arm_rows(false);
            if rows1.is_empty() || rows0.is_empty() {
                return Err(FitError::DegenerateTreatment {
                    treated: rows1.len(),
                    control: rows0.len(),
                });
            }

            let beta1 = ridge_fit(data.features, data.outcome, &rows1, self.ridge)?;
            let beta0 = ridge_fit(data.features, data.outcome, &rows0, self.ridge)?;
            contrasts.push(beta1 - beta0);
        }

        Ok(LinearTModel { fold_of, contrasts })
    }
}

impl EffectModel for LinearTModel {
    fn predict_out_of_sample(&self, features: &DMatrix<f64>) -> Result<Vec<f64>, FitError> {
        if features.nrows() != self.fold_of.len() {
            return Err(FitError::FeatureMismatch {
                expected: self.fold_of.len(),
                got: features.nrows(),
            });
        }
        let p = self.contrasts.first().map_or(0, |c| c.len().saturating_sub(1));
        if features.ncols() != p {
            return Err(FitError::FeatureMismatch {
                expected: p,
                got: features.ncols(),
            });
        }

        let predictions = (0..features.nrows())
            .map(|i| {
                let beta = &self.contrasts[self.fold_of[i]];
                let slopes: f64 = (0..p).map(|j| beta[j + 1] * features[(i, j)]).sum();
                beta[0] + slopes
            })
            .collect();
        Ok(predictions)
    }
}

/// `(row, column)` of the first NaN or infinite entry, scanning by row.
fn first_non_finite(features: &DMatrix<f64>) -> Option<(usize, usize)> {
    (0..features.nrows())
        .flat_map(|i| (0..features.ncols()).map(move |j| (i, j)))
        .find(|&(i, j)| !features[(i, j)].is_finite())
}

/// Balanced random fold labels.
fn assign_folds(n: usize, folds: usize, seed: u64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    if folds > 1 {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        order.shuffle(&mut rng);
    }
    let mut fold_of = vec![0; n];
    for (position, &row) in order.iter().enumerate() {
        fold_of[row] = position % folds.max(1);
    }
    fold_of
}

/// Solve `(XᵀX + λD) β = Xᵀy` over `rows`, with `X = [1, features]` and `D`
/// the identity minus the intercept entry.
fn ridge_fit(
    features: &DMatrix<f64>,
    outcome: &[f64],
    rows: &[usize],
    lambda: f64,
) -> Result<DVector<f64>, FitError> {
    let p = features.ncols() + 1;
    let design = DMatrix::from_fn(rows.len(), p, |i, j| {
        if j == 0 {
            1.0
        } else {
            features[(rows[i], j - 1)]
        }
    });
    let y = DVector::from_iterator(rows.len(), rows.iter().map(|&i| outcome[i]));

    let mut gram = design.transpose() * &design;
    for j in 1..p {
        gram[(j, j)] += lambda;
    }
    let rhs = design.transpose() * y;

    let chol = Cholesky::new(gram).ok_or(FitError::Singular)?;
    Ok(chol.solve(&rhs))
}
