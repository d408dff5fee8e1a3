//! Decomposition result types and related structures.

use serde::{Deserialize, Serialize};

use crate::analysis::DecompositionPlan;
use crate::config::Method;
use crate::error::ReplicateError;
use crate::types::Measure;

/// How the values of a measure table came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueOrigin {
    /// Computed from outcomes or estimator predictions.
    Estimated,
    /// Copied from another measure that coincides with this one under the
    /// current configuration (e.g. `te = tv` without mediators).
    Aliased,
    /// Zero because the causal path does not exist.
    StructuralZero,
    /// NaN because the measure is not identified.
    Undefined,
}

impl ValueOrigin {
    /// True for zero or undefined placeholders.
    pub fn is_placeholder(self) -> bool {
        matches!(self, ValueOrigin::StructuralZero | ValueOrigin::Undefined)
    }
}

/// Values of one measure for every inner bootstrap id of one outer replicate.
///
/// `values()[b]` belongs to inner id `b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureTable {
    measure: Measure,
    origin: ValueOrigin,
    values: Vec<f64>,
}

impl MeasureTable {
    /// Create a table.
    pub fn new(measure: Measure, origin: ValueOrigin, values: Vec<f64>) -> Self {
        Self {
            measure,
            origin,
            values,
        }
    }

    /// Measure name.
    pub fn measure(&self) -> Measure {
        self.measure
    }

    /// Where the values came from.
    pub fn origin(&self) -> ValueOrigin {
        self.origin
    }

    /// One value per inner id.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of inner ids.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if there are no inner ids.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// All ten measure tables of one outer replicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicateEffects {
    rep: usize,
    tables: Vec<MeasureTable>,
}

impl ReplicateEffects {
    /// Bundle the tables of replicate `rep`.
    pub fn new(rep: usize, tables: Vec<MeasureTable>) -> Self {
        Self { rep, tables }
    }

    /// Outer replicate index.
    pub fn rep(&self) -> usize {
        self.rep
    }

    /// Tables in canonical measure order.
    pub fn tables(&self) -> &[MeasureTable] {
        &self.tables
    }

    /// Table for one measure.
    pub fn get(&self, measure: Measure) -> Option<&MeasureTable> {
        self.tables.iter().find(|t| t.measure() == measure)
    }

    /// Flatten into `(rep, boot, measure, value, origin)` rows.
    pub fn rows(&self) -> impl Iterator<Item = EffectRow> + '_ {
        self.tables.iter().flat_map(move |table| {
            table.values().iter().enumerate().map(move |(boot, &value)| EffectRow {
                rep: self.rep,
                boot,
                measure: table.measure(),
                value,
                origin: table.origin(),
            })
        })
    }
}

/// One row of the concatenated effect table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectRow {
    /// Outer replicate index.
    pub rep: usize,
    /// Inner bootstrap id.
    pub boot: usize,
    /// Measure name.
    pub measure: Measure,
    /// Measure value (NaN when undefined).
    pub value: f64,
    /// How the value came about.
    pub origin: ValueOrigin,
}

/// Concatenation of every successful replicate's rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectTable {
    rows: Vec<EffectRow>,
}

impl EffectTable {
    /// Concatenate replicate tables in the given order.
    pub fn from_replicates(replicates: &[ReplicateEffects]) -> Self {
        Self {
            rows: replicates.iter().flat_map(ReplicateEffects::rows).collect(),
        }
    }

    /// All rows.
    pub fn rows(&self) -> &[EffectRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of one measure.
    pub fn measure_rows(&self, measure: Measure) -> impl Iterator<Item = &EffectRow> + '_ {
        self.rows.iter().filter(move |r| r.measure == measure)
    }

    /// Values of one measure, in row order.
    pub fn values(&self, measure: Measure) -> Vec<f64> {
        self.measure_rows(measure).map(|r| r.value).collect()
    }
}

/// Point estimate and bootstrap spread of one measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureSummary {
    /// Measure name.
    pub measure: Measure,
    /// Mean over all non-NaN rows (NaN if there are none).
    pub mean: f64,
    /// Sample standard deviation over all non-NaN rows (NaN below two rows).
    pub std: f64,
    /// Rows across all replicates.
    pub rows: usize,
    /// Rows that entered `mean` and `std`.
    pub finite_rows: usize,
    /// Replicates where the measure was computed.
    pub estimated_replicates: usize,
    /// Replicates where the measure was copied from a coinciding measure.
    pub aliased_replicates: usize,
    /// Replicates where the measure was a zero or undefined placeholder.
    pub placeholder_replicates: usize,
}

impl MeasureSummary {
    /// Replicates that contributed a real (non-placeholder) value.
    pub fn real_replicates(&self) -> usize {
        self.estimated_replicates + self.aliased_replicates
    }

    /// True if every contributing replicate was a placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.placeholder_replicates > 0 && self.real_replicates() == 0
    }
}

/// An outer replicate excluded from the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicateFailure {
    /// Outer replicate index.
    pub rep: usize,
    /// Why it failed.
    pub error: ReplicateError,
}

/// Metadata for reproducing and auditing a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Method used.
    pub method: Method,
    /// Which formula set applied.
    pub plan: DecompositionPlan,
    /// Outer replicates requested.
    pub nboot1: usize,
    /// Inner replicates per outer replicate.
    pub nboot2: usize,
    /// Base seed actually used.
    pub seed: u64,
    /// Outer replicates that succeeded.
    pub successful_replicates: usize,
    /// Wall-clock runtime in seconds.
    pub runtime_secs: f64,
}

/// Complete result of a decomposition run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    /// Every row of every successful replicate, ordered by replicate.
    pub effects: EffectTable,
    /// One summary per measure, in canonical order.
    pub summary: Vec<MeasureSummary>,
    /// Replicates skipped because they failed.
    pub failures: Vec<ReplicateFailure>,
    /// Run metadata.
    pub metadata: Metadata,
}

impl Decomposition {
    /// Summary of one measure.
    pub fn summary_for(&self, measure: Measure) -> Option<&MeasureSummary> {
        self.summary.iter().find(|s| s.measure == measure)
    }

    /// Mean of one measure (NaN if absent).
    pub fn mean(&self, measure: Measure) -> f64 {
        self.summary_for(measure).map_or(f64::NAN, |s| s.mean)
    }

    /// True if no replicate failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
