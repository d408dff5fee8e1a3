//! One outer replicate of the decomposition.
//!
//! Each replicate:
//! 1. draws the outer bootstrap sample (identity for replicate 0)
//! 2. draws `nboot2` inner index sets over it
//! 3. fits the estimator on the mediators and, separately, on mediators plus
//!    confounders, as the plan requires
//! 4. aggregates outcomes and predictions into the ten measure tables
//!
//! Replicates share nothing mutable, so they can run in any order or in
//! parallel and still give identical results for a fixed base seed.

use nalgebra::DMatrix;

use crate::analysis::placeholder::{fill, Fill};
use crate::analysis::plan::{DecompositionPlan, Derivation};
use crate::data::PreparedData;
use crate::error::ReplicateError;
use crate::estimator::{EffectEstimator, EffectModel, FitData, ForestParams};
use crate::result::{MeasureTable, ReplicateEffects};
use crate::statistics::{
    counter_rng_seed, measure_one, measure_three, measure_two, outer_bootstrap_rows,
    replicate_rng, BootstrapIndexSet, Term,
};
use crate::types::{IndexSubset, Measure};

/// Seed stream for the mediator-only fit.
const MEDIATOR_FIT_STREAM: u64 = 1;
/// Seed stream for the mediator-plus-confounder fit.
const COMBINED_FIT_STREAM: u64 = 2;

/// Runs outer replicates against one prepared dataset.
#[derive(Debug)]
pub struct ReplicateRunner<'a, E> {
    data: &'a PreparedData<'a>,
    estimator: &'a E,
    params: &'a ForestParams,
    nboot: usize,
    base_seed: u64,
    plan: DecompositionPlan,
}

impl<'a, E: EffectEstimator> ReplicateRunner<'a, E> {
    /// Runner drawing `nboot` inner replicates per outer replicate.
    pub fn new(
        data: &'a PreparedData<'a>,
        estimator: &'a E,
        params: &'a ForestParams,
        nboot: usize,
        base_seed: u64,
    ) -> Self {
        let plan = DecompositionPlan::from_sets(data.n_mediators() > 0, data.n_confounders() > 0);
        Self {
            data,
            estimator,
            params,
            nboot,
            base_seed,
            plan,
        }
    }

    /// Formula set in use.
    pub fn plan(&self) -> DecompositionPlan {
        self.plan
    }

    /// Compute every measure table for outer replicate `rep`.
    pub fn run(&self, rep: usize) -> Result<ReplicateEffects, ReplicateError> {
        tracing::debug!(rep, plan = ?self.plan, "replicate start");
        let mut rng = replicate_rng(self.base_seed, rep);
        let rows = outer_bootstrap_rows(self.data.n_rows(), rep, &mut rng);
        let m = rows.len();

        let all_treated = self.data.treated();
        let all_outcome = self.data.outcome();
        let treated: Vec<bool> = rows.iter().map(|&r| all_treated[r]).collect();
        let y: Vec<f64> = rows.iter().map(|&r| all_outcome[r]).collect();
        self.check_levels(&treated)?;

        let index = BootstrapIndexSet::draw(&treated, self.nboot, rep == 0, &mut rng);
        tracing::trace!(rep, rows = m, nboot = self.nboot, "drew bootstrap indices");

        let tv = measure_two(
            Term::pos(&y, IndexSubset::Id1),
            Term::neg(&y, IndexSubset::Id0),
            Measure::Tv,
            &index,
        );

        let rep_seed = counter_rng_seed(self.base_seed, rep as u64);
        let p1 = if self.plan.fits_mediators() {
            let features = self.data.mediator_features(&rows);
            self.fit_predict(&features, &treated, &y, counter_rng_seed(rep_seed, MEDIATOR_FIT_STREAM))?
        } else {
            // Without mediators the first-stage effect is the total variation
            // of the unresampled outer sample.
            vec![tv.values().first().copied().unwrap_or(f64::NAN); m]
        };
        let p2 = if self.plan.fits_confounders() {
            let features = self.data.combined_features(&rows);
            self.fit_predict(&features, &treated, &y, counter_rng_seed(rep_seed, COMBINED_FIT_STREAM))?
        } else {
            Vec::new()
        };

        let signals = Signals {
            y: &y,
            p1: &p1,
            p2: &p2,
        };
        let mut tables: Vec<MeasureTable> = Vec::with_capacity(Measure::ALL.len());
        for measure in Measure::ALL {
            let table = match self.plan.derivation(measure) {
                Derivation::Estimated if measure == Measure::Tv => tv.clone(),
                Derivation::Estimated => signals.estimate(measure, &index, &tv),
                Derivation::Alias(source) => fill(&tables[source.index()], measure, Fill::Alias),
                Derivation::Zero => fill(&tv, measure, Fill::Zero),
                Derivation::Undefined => fill(&tv, measure, Fill::Undefined),
            };
            tables.push(table);
        }

        tracing::debug!(rep, rows = m, plan = ?self.plan, "replicate complete");
        Ok(ReplicateEffects::new(rep, tables))
    }

    fn check_levels(&self, treated: &[bool]) -> Result<(), ReplicateError> {
        let rows = treated.len();
        if !treated.iter().any(|&t| !t) {
            return Err(ReplicateError::DegenerateSample {
                level: self.data.x0().to_string(),
                rows,
            });
        }
        if !treated.iter().any(|&t| t) {
            return Err(ReplicateError::DegenerateSample {
                level: self.data.x1().to_string(),
                rows,
            });
        }
        Ok(())
    }

    fn fit_predict(
        &self,
        features: &DMatrix<f64>,
        treated: &[bool],
        y: &[f64],
        seed: u64,
    ) -> Result<Vec<f64>, ReplicateError> {
        let fit_data = FitData {
            features,
            treatment: treated,
            outcome: y,
            params: self.params,
            seed,
        };
        tracing::debug!(rows = features.nrows(), features = features.ncols(), "fitting effect estimator");
        let model = self.estimator.fit(&fit_data)?;
        let predictions = model.predict_out_of_sample(features)?;
        if predictions.len() != features.nrows() {
            return Err(ReplicateError::PredictionLength {
                expected: features.nrows(),
                got: predictions.len(),
            });
        }
        Ok(predictions)
    }
}

/// Per-unit arrays of one outer sample: outcome, mediator-stage predictions
/// and combined-stage predictions.
struct Signals<'s> {
    y: &'s [f64],
    p1: &'s [f64],
    p2: &'s [f64],
}

impl Signals<'_> {
    fn estimate(&self, measure: Measure, index: &BootstrapIndexSet, tv: &MeasureTable) -> MeasureTable {
        use IndexSubset::{All, Id0, Id1};

        let Signals { y, p1, p2 } = *self;
        match measure {
            Measure::Tv => measure_two(Term::pos(y, Id1), Term::neg(y, Id0), measure, index),
            Measure::Te => measure_one(Term::pos(p1, All), measure, index),
            Measure::Ett => measure_one(Term::pos(p1, Id0), measure, index),
            Measure::Ctfse => measure_three(
                Term::pos(p1, Id0),
                Term::neg(y, Id1),
                Term::pos(y, Id0),
                measure,
                index,
            ),
            Measure::Nde => measure_one(Term::pos(p2, All), measure, index),
            Measure::Ctfde => measure_one(Term::pos(p2, Id0), measure, index),
            Measure::Nie => measure_two(Term::pos(p2, All), Term::neg(p1, All), measure, index),
            Measure::Ctfie => measure_two(Term::pos(p2, Id0), Term::neg(p1, Id0), measure, index),
            // Never identified by a single effect estimator.
            Measure::ExpseX0 | Measure::ExpseX1 => fill(tv, measure, Fill::Undefined),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dataset, Variables};
    use crate::estimator::{ConstantEstimator, FitError};
    use crate::result::ValueOrigin;

    fn dataset() -> Dataset {
        let n = 40;
        let x: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "a" } else { "b" }).collect();
        let z: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let w: Vec<f64> = (0..n).map(|i| (i % 3) as f64).collect();
        let y: Vec<f64> = (0..n).map(|i| i as f64 + if i % 2 == 1 { 2.0 } else { 0.0 }).collect();
        Dataset::new()
            .with_categorical("x", x)
            .unwrap()
            .with_numeric("z", z)
            .unwrap()
            .with_numeric("w", w)
            .unwrap()
            .with_numeric("y", y)
            .unwrap()
    }

    fn raw_tv(data: &PreparedData<'_>) -> f64 {
        let (mut s0, mut n0, mut s1, mut n1) = (0.0, 0.0, 0.0, 0.0);
        for (&t, &y) in data.treated().iter().zip(data.outcome()) {
            if t {
                s1 += y;
                n1 += 1.0;
            } else {
                s0 += y;
                n0 += 1.0;
            }
        }
        s1 / n1 - s0 / n0
    }

    struct Failing;

    impl EffectEstimator for Failing {
        type Model = crate::estimator::ConstantModel;

        fn fit(&self, _data: &FitData<'_>) -> Result<Self::Model, FitError> {
            Err(FitError::Other("boom".into()))
        }
    }

    #[test]
    fn test_reference_replicate_tv_is_raw_difference() {
        let data = dataset();
        let vars = Variables::new("x", "y", "a", "b");
        let prepared = vars.prepare(&data).unwrap();
        let params = ForestParams::default();
        let est = ConstantEstimator::new(0.0);
        let runner = ReplicateRunner::new(&prepared, &est, &params, 4, 7);

        let effects = runner.run(0).unwrap();
        let tv = effects.get(Measure::Tv).unwrap();
        assert_eq!(tv.len(), 4);
        assert!((tv.values()[0] - raw_tv(&prepared)).abs() < 1e-12);
    }

    #[test]
    fn test_tables_in_canonical_order() {
        let data = dataset();
        let vars = Variables::new("x", "y", "a", "b").mediators(["z"]).confounders(["w"]);
        let prepared = vars.prepare(&data).unwrap();
        let params = ForestParams::default();
        let est = ConstantEstimator::new(1.0);
        let runner = ReplicateRunner::new(&prepared, &est, &params, 3, 1);
        assert_eq!(runner.plan(), DecompositionPlan::Full);

        let effects = runner.run(2).unwrap();
        let order: Vec<Measure> = effects.tables().iter().map(|t| t.measure()).collect();
        assert_eq!(order, Measure::ALL.to_vec());
        assert!(effects.tables().iter().all(|t| t.len() == 3));
    }

    #[test]
    fn test_raw_plan_placeholders() {
        let data = dataset();
        let vars = Variables::new("x", "y", "a", "b");
        let prepared = vars.prepare(&data).unwrap();
        let params = ForestParams::default();
        let runner = ReplicateRunner::new(&prepared, &Failing, &params, 5, 3);
        assert_eq!(runner.plan(), DecompositionPlan::Raw);

        // No fit happens, so the failing estimator is never called.
        let effects = runner.run(1).unwrap();
        let tv = effects.get(Measure::Tv).unwrap().values().to_vec();
        for m in [Measure::Te, Measure::Ett, Measure::Nde, Measure::Ctfde] {
            let table = effects.get(m).unwrap();
            assert_eq!(table.origin(), ValueOrigin::Aliased);
            for (a, b) in table.values().iter().zip(&tv) {
                assert!(a == b || (a.is_nan() && b.is_nan()));
            }
        }
        for m in [Measure::ExpseX0, Measure::ExpseX1, Measure::Ctfse, Measure::Nie, Measure::Ctfie] {
            assert!(effects.get(m).unwrap().values().iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_full_plan_with_constant_effect() {
        let data = dataset();
        let vars = Variables::new("x", "y", "a", "b").mediators(["z"]).confounders(["w"]);
        let prepared = vars.prepare(&data).unwrap();
        let params = ForestParams::default();
        let est = ConstantEstimator::new(2.5);
        let runner = ReplicateRunner::new(&prepared, &est, &params, 6, 11);

        let effects = runner.run(0).unwrap();
        let get = |m: Measure| effects.get(m).unwrap().values().to_vec();
        assert!(get(Measure::Te).iter().all(|&v| v == 2.5));
        assert!(get(Measure::Nde).iter().all(|&v| v == 2.5));
        assert!(get(Measure::Nie).iter().all(|&v| v == 0.0));
        assert!(get(Measure::Ctfie).iter().all(|&v| v == 0.0));
        assert!(get(Measure::ExpseX1).iter().all(|v| v.is_nan()));

        // ctfse = ett - tv
        let (ett, tv, ctfse) = (get(Measure::Ett), get(Measure::Tv), get(Measure::Ctfse));
        for b in 0..6 {
            assert!((ctfse[b] - (ett[b] - tv[b])).abs() < 1e-12);
        }
    }

    #[test]
    fn test_confounder_only_uses_tv_as_first_stage() {
        let data = dataset();
        let vars = Variables::new("x", "y", "a", "b").confounders(["w"]);
        let prepared = vars.prepare(&data).unwrap();
        let params = ForestParams::default();
        let est = ConstantEstimator::new(1.0);
        let runner = ReplicateRunner::new(&prepared, &est, &params, 2, 5);
        assert_eq!(runner.plan(), DecompositionPlan::ConfounderOnly);

        let effects = runner.run(0).unwrap();
        let tv0 = effects.get(Measure::Tv).unwrap().values()[0];
        let nie = effects.get(Measure::Nie).unwrap().values().to_vec();
        assert!(nie.iter().all(|&v| (v - (1.0 - tv0)).abs() < 1e-12));
        assert_eq!(effects.get(Measure::Te).unwrap().origin(), ValueOrigin::Aliased);
    }

    #[test]
    fn test_estimator_failure_is_reported() {
        let data = dataset();
        let vars = Variables::new("x", "y", "a", "b").mediators(["z"]);
        let prepared = vars.prepare(&data).unwrap();
        let params = ForestParams::default();
        let runner = ReplicateRunner::new(&prepared, &Failing, &params, 2, 0);
        assert_eq!(
            runner.run(0).unwrap_err(),
            ReplicateError::Fit(FitError::Other("boom".into()))
        );
    }

    #[test]
    fn test_degenerate_outer_sample() {
        // One x1 row out of many: some outer resample will miss it.
        let n = 30;
        let x: Vec<&str> = (0..n).map(|i| if i == 0 { "b" } else { "a" }).collect();
        let data = Dataset::new()
            .with_categorical("x", x)
            .unwrap()
            .with_numeric("y", vec![1.0; n])
            .unwrap();
        let vars = Variables::new("x", "y", "a", "b");
        let prepared = vars.prepare(&data).unwrap();
        let params = ForestParams::default();
        let est = ConstantEstimator::new(0.0);
        let runner = ReplicateRunner::new(&prepared, &est, &params, 1, 42);

        let failure = (1..200).find_map(|rep| runner.run(rep).err());
        assert!(matches!(
            failure,
            Some(ReplicateError::DegenerateSample { ref level, rows: 30 }) if level == "'b'"
        ));
    }

    #[test]
    fn test_replicates_are_reproducible() {
        let data = dataset();
        let vars = Variables::new("x", "y", "a", "b").mediators(["z"]);
        let prepared = vars.prepare(&data).unwrap();
        let params = ForestParams::default();
        let est = crate::estimator::LinearTLearner::new();
        let runner = ReplicateRunner::new(&prepared, &est, &params, 3, 99);

        let a = runner.run(4);
        let b = runner.run(4);
        match (a, b) {
            (Ok(a), Ok(b)) => {
                for (ta, tb) in a.tables().iter().zip(b.tables()) {
                    for (va, vb) in ta.values().iter().zip(tb.values()) {
                        assert!(va == vb || (va.is_nan() && vb.is_nan()));
                    }
                }
            }
            (Err(a), Err(b)) => assert_eq!(a, b),
            _ => panic!("same replicate gave different outcomes"),
        }
    }
}
