//! Measure names and index-subset keys shared across the crate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the ten named decomposition terms.
///
/// Every successful outer replicate carries exactly one table per measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// Total variation: raw outcome gap between the two attribute levels.
    Tv,
    /// Total effect.
    Te,
    /// Expected spurious effect with `x1` as reference level.
    ExpseX1,
    /// Expected spurious effect with `x0` as reference level.
    ExpseX0,
    /// Effect of treatment on the treated.
    Ett,
    /// Counterfactual spurious effect.
    Ctfse,
    /// Natural direct effect.
    Nde,
    /// Natural indirect effect.
    Nie,
    /// Counterfactual direct effect.
    Ctfde,
    /// Counterfactual indirect effect.
    Ctfie,
}

impl Measure {
    /// All measures in canonical order.
    pub const ALL: [Measure; 10] = [
        Measure::Tv,
        Measure::Te,
        Measure::ExpseX1,
        Measure::ExpseX0,
        Measure::Ett,
        Measure::Ctfse,
        Measure::Nde,
        Measure::Nie,
        Measure::Ctfde,
        Measure::Ctfie,
    ];

    /// Short name used in tables and reports.
    pub fn name(self) -> &'static str {
        match self {
            Measure::Tv => "tv",
            Measure::Te => "te",
            Measure::ExpseX1 => "expse_x1",
            Measure::ExpseX0 => "expse_x0",
            Measure::Ett => "ett",
            Measure::Ctfse => "ctfse",
            Measure::Nde => "nde",
            Measure::Nie => "nie",
            Measure::Ctfde => "ctfde",
            Measure::Ctfie => "ctfie",
        }
    }

    /// Position in [`Measure::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which part of an inner bootstrap draw a term averages over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexSubset {
    /// Every drawn row.
    All,
    /// Drawn rows at level `x0`.
    Id0,
    /// Drawn rows at level `x1`.
    Id1,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order_matches_index() {
        for (i, m) in Measure::ALL.iter().enumerate() {
            assert_eq!(m.index(), i);
        }
    }

    #[test]
    fn test_serde_uses_short_names() {
        let json = serde_json::to_string(&Measure::ExpseX1).unwrap();
        assert_eq!(json, "\"expse_x1\"");
        for m in Measure::ALL {
            let json = serde_json::to_string(&m).unwrap();
            assert_eq!(json, format!("\"{}\"", m.name()));
        }
    }
}
