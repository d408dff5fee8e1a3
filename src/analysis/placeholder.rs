//! Tables derived from another table instead of from the data.

use crate::result::{MeasureTable, ValueOrigin};
use crate::types::Measure;

/// How to rewrite a template table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// Keep the template's values.
    Alias,
    /// Replace every value with `0.0`.
    Zero,
    /// Replace every value with NaN.
    Undefined,
}

/// Build the table for `measure` from `template`.
///
/// The result has one value per inner id of the template, so placeholder
/// tables line up with the estimated ones of the same replicate.
pub fn fill(template: &MeasureTable, measure: Measure, fill: Fill) -> MeasureTable {
    let (origin, values) = match fill {
        Fill::Alias => (ValueOrigin::Aliased, template.values().to_vec()),
        Fill::Zero => (ValueOrigin::StructuralZero, vec![0.0; template.len()]),
        Fill::Undefined => (ValueOrigin::Undefined, vec![f64::NAN; template.len()]),
    };
    MeasureTable::new(measure, origin, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tv() -> MeasureTable {
        MeasureTable::new(Measure::Tv, ValueOrigin::Estimated, vec![0.5, f64::NAN, -1.0])
    }

    #[test]
    fn test_alias_copies_values() {
        let te = fill(&tv(), Measure::Te, Fill::Alias);
        assert_eq!(te.measure(), Measure::Te);
        assert_eq!(te.origin(), ValueOrigin::Aliased);
        assert_eq!(te.values()[0], 0.5);
        assert!(te.values()[1].is_nan());
        assert_eq!(te.values()[2], -1.0);
    }

    #[test]
    fn test_zero_and_undefined_keep_shape() {
        let nie = fill(&tv(), Measure::Nie, Fill::Zero);
        assert_eq!(nie.values(), &[0.0, 0.0, 0.0]);
        assert_eq!(nie.origin(), ValueOrigin::StructuralZero);

        let expse = fill(&tv(), Measure::ExpseX1, Fill::Undefined);
        assert_eq!(expse.len(), 3);
        assert!(expse.values().iter().all(|v| v.is_nan()));
        assert_eq!(expse.origin(), ValueOrigin::Undefined);
    }
}
