//! Which measures are estimated, copied, or placeholders.
//!
//! The mediator set `Z` and confounder set `W` may each be empty. The four
//! combinations each fix one formula set, summarised by this lookup table
//! (`E` estimated, `= m` copied from measure `m`, `0` structural zero,
//! `NaN` undefined):
//!
//! | measure    | Raw     | MediatorOnly | ConfounderOnly | Full |
//! |------------|---------|--------------|----------------|------|
//! | `tv`       | E       | E            | E              | E    |
//! | `te`       | = tv    | E            | = tv           | E    |
//! | `expse_x1` | 0       | NaN          | 0              | NaN  |
//! | `expse_x0` | 0       | NaN          | 0              | NaN  |
//! | `ett`      | = tv    | E            | = tv           | E    |
//! | `ctfse`    | 0       | E            | 0              | E    |
//! | `nde`      | = te    | = te         | E              | E    |
//! | `nie`      | 0       | 0            | E              | E    |
//! | `ctfde`    | = ett   | = ett        | E              | E    |
//! | `ctfie`    | 0       | 0            | E              | E    |

use serde::{Deserialize, Serialize};

use crate::types::Measure;

/// Decomposition configuration implied by which variable sets are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecompositionPlan {
    /// No mediators, no confounders: no estimator fit.
    Raw,
    /// Mediators only: one fit on `Z`.
    MediatorOnly,
    /// Confounders only: one fit on `W`.
    ConfounderOnly,
    /// Both: fits on `Z` and on `Z ∪ W`.
    Full,
}

/// How one measure is produced under a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// Computed by the aggregator.
    Estimated,
    /// Same values as another, earlier measure.
    Alias(Measure),
    /// Structural zero.
    Zero,
    /// Not identified.
    Undefined,
}

impl DecompositionPlan {
    /// Plan for the given variable sets.
    pub fn from_sets(has_mediators: bool, has_confounders: bool) -> Self {
        match (has_mediators, has_confounders) {
            (false, false) => DecompositionPlan::Raw,
            (true, false) => DecompositionPlan::MediatorOnly,
            (false, true) => DecompositionPlan::ConfounderOnly,
            (true, true) => DecompositionPlan::Full,
        }
    }

    /// True if the estimator is fitted on the mediators.
    pub fn fits_mediators(self) -> bool {
        matches!(self, DecompositionPlan::MediatorOnly | DecompositionPlan::Full)
    }

    /// True if the estimator is fitted on mediators plus confounders.
    pub fn fits_confounders(self) -> bool {
        matches!(self, DecompositionPlan::ConfounderOnly | DecompositionPlan::Full)
    }

    /// Estimator fits per outer replicate.
    pub fn fits(self) -> usize {
        usize::from(self.fits_mediators()) + usize::from(self.fits_confounders())
    }

    /// How `measure` is produced. Alias sources always precede the alias in
    /// [`Measure::ALL`] order.
    pub fn derivation(self, measure: Measure) -> Derivation {
        use Derivation::*;
        use Measure::*;

        let z = self.fits_mediators();
        let w = self.fits_confounders();
        match measure {
            Tv => Estimated,
            Te | Ett if z => Estimated,
            Te | Ett => Alias(Tv),
            ExpseX1 | ExpseX0 if z => Undefined,
            ExpseX1 | ExpseX0 => Zero,
            Ctfse if z => Estimated,
            Ctfse => Zero,
            Nde | Nie | Ctfde | Ctfie if w => Estimated,
            Nde => Alias(Te),
            Ctfde => Alias(Ett),
            Nie | Ctfie => Zero,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLANS: [DecompositionPlan; 4] = [
        DecompositionPlan::Raw,
        DecompositionPlan::MediatorOnly,
        DecompositionPlan::ConfounderOnly,
        DecompositionPlan::Full,
    ];

    #[test]
    fn test_from_sets() {
        assert_eq!(DecompositionPlan::from_sets(false, false), DecompositionPlan::Raw);
        assert_eq!(DecompositionPlan::from_sets(true, false), DecompositionPlan::MediatorOnly);
        assert_eq!(DecompositionPlan::from_sets(false, true), DecompositionPlan::ConfounderOnly);
        assert_eq!(DecompositionPlan::from_sets(true, true), DecompositionPlan::Full);
        assert_eq!(DecompositionPlan::Raw.fits(), 0);
        assert_eq!(DecompositionPlan::Full.fits(), 2);
    }

    #[test]
    fn test_alias_sources_come_first() {
        for plan in PLANS {
            for measure in Measure::ALL {
                if let Derivation::Alias(source) = plan.derivation(measure) {
                    assert!(source.index() < measure.index(), "{:?} {:?}", plan, measure);
                    assert!(!matches!(
                        plan.derivation(source),
                        Derivation::Zero | Derivation::Undefined
                    ));
                }
            }
        }
    }

    #[test]
    fn test_raw_plan_table() {
        let plan = DecompositionPlan::Raw;
        assert_eq!(plan.derivation(Measure::Te), Derivation::Alias(Measure::Tv));
        assert_eq!(plan.derivation(Measure::Ett), Derivation::Alias(Measure::Tv));
        assert_eq!(plan.derivation(Measure::Nde), Derivation::Alias(Measure::Te));
        assert_eq!(plan.derivation(Measure::Ctfde), Derivation::Alias(Measure::Ett));
        for m in [Measure::ExpseX0, Measure::ExpseX1, Measure::Ctfse, Measure::Nie, Measure::Ctfie] {
            assert_eq!(plan.derivation(m), Derivation::Zero);
        }
    }

    #[test]
    fn test_full_plan_table() {
        let plan = DecompositionPlan::Full;
        for m in Measure::ALL {
            let expected = match m {
                Measure::ExpseX0 | Measure::ExpseX1 => Derivation::Undefined,
                _ => Derivation::Estimated,
            };
            assert_eq!(plan.derivation(m), expected);
        }
    }

    #[test]
    fn test_confounder_only_table() {
        let plan = DecompositionPlan::ConfounderOnly;
        assert_eq!(plan.derivation(Measure::Te), Derivation::Alias(Measure::Tv));
        assert_eq!(plan.derivation(Measure::Ctfse), Derivation::Zero);
        assert_eq!(plan.derivation(Measure::Nie), Derivation::Estimated);
        assert_eq!(plan.derivation(Measure::Ctfie), Derivation::Estimated);
    }
}
