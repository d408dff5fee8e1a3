//! Group-conditional means over inner bootstrap draws.
//!
//! A measure is a sum of one, two, or three terms. Each term is the mean of a
//! per-unit array over one index subset of an inner draw, optionally negated,
//! so a difference of conditional means such as `E[y | x1] - E[y | x0]` is
//! `measure_two(Term::pos(y, Id1), Term::neg(y, Id0), ..)`.

use crate::result::{MeasureTable, ValueOrigin};
use crate::statistics::BootstrapIndexSet;
use crate::types::{IndexSubset, Measure};

/// One summand of a measure.
#[derive(Debug, Clone, Copy)]
pub struct Term<'a> {
    values: &'a [f64],
    subset: IndexSubset,
    negated: bool,
}

impl<'a> Term<'a> {
    /// `+mean(values[subset])`.
    pub fn pos(values: &'a [f64], subset: IndexSubset) -> Self {
        Self {
            values,
            subset,
            negated: false,
        }
    }

    /// `-mean(values[subset])`.
    pub fn neg(values: &'a [f64], subset: IndexSubset) -> Self {
        Self {
            values,
            subset,
            negated: true,
        }
    }

    fn evaluate(&self, index: &BootstrapIndexSet, b: usize) -> f64 {
        let mean = nan_mean(self.values, index.subset(b, self.subset));
        if self.negated {
            -mean
        } else {
            mean
        }
    }
}

/// Single-term measure.
pub fn measure_one(a: Term<'_>, measure: Measure, index: &BootstrapIndexSet) -> MeasureTable {
    aggregate(&[a], measure, index)
}

/// Two-term measure.
pub fn measure_two(
    a: Term<'_>,
    b: Term<'_>,
    measure: Measure,
    index: &BootstrapIndexSet,
) -> MeasureTable {
    aggregate(&[a, b], measure, index)
}

/// Three-term measure.
pub fn measure_three(
    a: Term<'_>,
    b: Term<'_>,
    c: Term<'_>,
    measure: Measure,
    index: &BootstrapIndexSet,
) -> MeasureTable {
    aggregate(&[a, b, c], measure, index)
}

fn aggregate(terms: &[Term<'_>], measure: Measure, index: &BootstrapIndexSet) -> MeasureTable {
    debug_assert!(terms.iter().all(|t| t.values.len() == index.rows()));

    let values = (0..index.nboot())
        .map(|b| terms.iter().map(|t| t.evaluate(index, b)).sum::<f64>())
        .collect();

    MeasureTable::new(measure, ValueOrigin::Estimated, values)
}

/// Mean of `values` at `positions`, skipping NaN entries.
///
/// Returns NaN when no non-NaN value is selected, including when `positions`
/// is empty.
pub fn nan_mean(values: &[f64], positions: &[usize]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for &i in positions {
        let v = values[i];
        if !v.is_nan() {
            sum += v;
            count += 1;
        }
    }
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}
