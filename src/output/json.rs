//! JSON serialization for decomposition results.
//!
//! NaN values (undefined measures, empty groups) are written as `null`.

use crate::result::Decomposition;

/// Compact single-line JSON of the whole decomposition.
///
/// # Errors
///
/// Only if `serde_json` rejects the value. A [`Decomposition`] holds no maps
/// with non-string keys and its NaN measures become `null`, so this does not
/// fail in practice.
pub fn to_json(result: &Decomposition) -> Result<String, serde_json::Error> {
    serde_json::to_string(result)
}

/// Indented JSON for reports meant to be read by people.
///
/// # Errors
///
/// Same as [`to_json`].
pub fn to_json_pretty(result: &Decomposition) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DecompositionPlan;
    use crate::config::Method;
    use crate::error::ReplicateError;
    use crate::result::{
        EffectTable, MeasureTable, Metadata, ReplicateEffects, ReplicateFailure, ValueOrigin,
    };
    use crate::statistics::summarize;
    use crate::types::Measure;

    fn make_decomposition() -> Decomposition {
        let replicates = vec![ReplicateEffects::new(
            0,
            vec![
                MeasureTable::new(Measure::Tv, ValueOrigin::Estimated, vec![0.25, 0.75]),
                MeasureTable::new(Measure::ExpseX1, ValueOrigin::Undefined, vec![f64::NAN; 2]),
            ],
        )];
        Decomposition {
            effects: EffectTable::from_replicates(&replicates),
            summary: summarize(&replicates),
            failures: vec![ReplicateFailure {
                rep: 1,
                error: ReplicateError::PredictionLength { expected: 4, got: 3 },
            }],
            metadata: Metadata {
                method: Method::CausalForest,
                plan: DecompositionPlan::MediatorOnly,
                nboot1: 2,
                nboot2: 2,
                seed: 17,
                successful_replicates: 1,
                runtime_secs: 0.5,
            },
        }
    }

    #[test]
    fn test_to_json() {
        let json = to_json(&make_decomposition()).unwrap();
        assert!(json.contains("\"measure\":\"tv\""));
        assert!(json.contains("\"value\":0.75"));
        assert!(json.contains("\"origin\":\"undefined\""));
        assert!(json.contains("\"plan\":\"mediator_only\""));
        assert!(json.contains("\"seed\":17"));
        assert!(json.contains("\"value\":null"));
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json_pretty(&make_decomposition()).unwrap();
        assert!(json.contains('\n'));
        assert!(json.contains("prediction_length"));
    }
}
