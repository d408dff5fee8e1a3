//! Per-measure mean and standard deviation across all bootstrap rows.

use crate::result::{MeasureSummary, ReplicateEffects, ValueOrigin};
use crate::types::Measure;

/// Online mean/variance accumulator using Welford's algorithm.
///
/// Each replicate's table is accumulated on its own and the partial results
/// are combined with Chan's parallel merge, so the summary does not depend on
/// the order replicates finished in.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Welford {
    n: usize,
    mean: f64,
    m2: f64,
}

impl Welford {
    /// Empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one observation.
    ///
    /// ```text
    /// δ = x - μₙ₋₁
    /// μₙ = μₙ₋₁ + δ/n
    /// M2ₙ = M2ₙ₋₁ + δ·(x - μₙ)
    /// ```
    pub fn update(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);
    }

    /// Merge another accumulator into this one.
    ///
    /// ```text
    /// δ = μ_B - μ_A
    /// μ_AB = (n_A·μ_A + n_B·μ_B) / n_AB
    /// M2_AB = M2_A + M2_B + (n_A·n_B/n_AB)·δ²
    /// ```
    pub fn merge(&mut self, other: &Self) {
        if other.n == 0 {
            return;
        }
        if self.n == 0 {
            *self = *other;
            return;
        }

        let n_a = self.n as f64;
        let n_b = other.n as f64;
        let n_ab = n_a + n_b;
        let delta = other.mean - self.mean;

        self.mean = (n_a * self.mean + n_b * other.mean) / n_ab;
        self.m2 += other.m2 + delta * delta * (n_a * n_b / n_ab);
        self.n += other.n;
    }

    /// Observations seen.
    pub fn count(&self) -> usize {
        self.n
    }

    /// Mean, or NaN when empty.
    pub fn mean(&self) -> f64 {
        if self.n == 0 {
            f64::NAN
        } else {
            self.mean
        }
    }

    /// Sample standard deviation (`n - 1` denominator), or NaN below two
    /// observations.
    pub fn std(&self) -> f64 {
        if self.n < 2 {
            f64::NAN
        } else {
            (self.m2 / (self.n - 1) as f64).sqrt()
        }
    }
}

/// Summarise every measure across the given replicates.
///
/// NaN values are skipped, mirroring how the aggregator treats missing
/// predictions. Output follows [`Measure::ALL`] order.
pub fn summarize(replicates: &[ReplicateEffects]) -> Vec<MeasureSummary> {
    Measure::ALL
        .iter()
        .map(|&measure| summarize_measure(measure, replicates))
        .collect()
}

fn summarize_measure(measure: Measure, replicates: &[ReplicateEffects]) -> MeasureSummary {
    let mut total = Welford::new();
    let mut rows = 0;
    let mut estimated = 0;
    let mut aliased = 0;
    let mut placeholder = 0;

    for table in replicates.iter().filter_map(|r| r.get(measure)) {
        let mut acc = Welford::new();
        for &v in table.values() {
            if !v.is_nan() {
                acc.update(v);
            }
        }
        total.merge(&acc);
        rows += table.len();

        match table.origin() {
            ValueOrigin::Estimated => estimated += 1,
            ValueOrigin::Aliased => aliased += 1,
            ValueOrigin::StructuralZero | ValueOrigin::Undefined => placeholder += 1,
        }
    }

    MeasureSummary {
        measure,
        mean: total.mean(),
        std: total.std(),
        rows,
        finite_rows: total.count(),
        estimated_replicates: estimated,
        aliased_replicates: aliased,
        placeholder_replicates: placeholder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::MeasureTable;

    fn naive_std(values: &[f64]) -> f64 {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1.0)).sqrt()
    }

    #[test]
    fn test_welford_matches_two_pass() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let mut acc = Welford::new();
        for v in values {
            acc.update(v);
        }
        assert!((acc.mean() - 5.0).abs() < 1e-12);
        assert!((acc.std() - naive_std(&values)).abs() < 1e-12);
    }

    #[test]
    fn test_merge_equals_sequential() {
        let left = [1.0, 2.5, -3.0];
        let right = [10.0, 0.25, 4.0, 8.0];

        let mut a = Welford::new();
        left.iter().for_each(|&v| a.update(v));
        let mut b = Welford::new();
        right.iter().for_each(|&v| b.update(v));
        a.merge(&b);

        let mut seq = Welford::new();
        left.iter().chain(&right).for_each(|&v| seq.update(v));

        assert_eq!(a.count(), 7);
        assert!((a.mean() - seq.mean()).abs() < 1e-12);
        assert!((a.std() - seq.std()).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_counts() {
        let mut acc = Welford::new();
        assert!(acc.mean().is_nan());
        acc.update(3.0);
        assert_eq!(acc.mean(), 3.0);
        assert!(acc.std().is_nan());
    }

    #[test]
    fn test_summarize_counts_origins_and_skips_nan() {
        let replicates = vec![
            ReplicateEffects::new(
                0,
                vec![
                    MeasureTable::new(Measure::Tv, ValueOrigin::Estimated, vec![1.0, 3.0]),
                    MeasureTable::new(Measure::ExpseX0, ValueOrigin::Undefined, vec![f64::NAN; 2]),
                    MeasureTable::new(Measure::Nie, ValueOrigin::StructuralZero, vec![0.0, 0.0]),
                ],
            ),
            ReplicateEffects::new(
                1,
                vec![
                    MeasureTable::new(Measure::Tv, ValueOrigin::Estimated, vec![f64::NAN, 5.0]),
                    MeasureTable::new(Measure::ExpseX0, ValueOrigin::Undefined, vec![f64::NAN; 2]),
                    MeasureTable::new(Measure::Nie, ValueOrigin::StructuralZero, vec![0.0, 0.0]),
                ],
            ),
        ];

        let summary = summarize(&replicates);
        assert_eq!(summary.len(), 10);

        let tv = &summary[Measure::Tv.index()];
        assert_eq!(tv.rows, 4);
        assert_eq!(tv.finite_rows, 3);
        assert!((tv.mean - 3.0).abs() < 1e-12);
        assert!((tv.std - 2.0).abs() < 1e-12);
        assert_eq!(tv.estimated_replicates, 2);

        let expse = &summary[Measure::ExpseX0.index()];
        assert!(expse.mean.is_nan());
        assert!(expse.is_placeholder());

        let nie = &summary[Measure::Nie.index()];
        assert_eq!(nie.mean, 0.0);
        assert_eq!(nie.std, 0.0);
        assert_eq!(nie.placeholder_replicates, 2);
        assert_eq!(nie.real_replicates(), 0);

        let te = &summary[Measure::Te.index()];
        assert_eq!(te.rows, 0);
        assert!(te.mean.is_nan());
    }
}
