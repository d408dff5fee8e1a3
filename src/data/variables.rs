//! Variable roles and the validated numeric view used by the engine.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use super::{Column, DataError, Dataset, Level};

/// Names the columns playing each causal role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variables {
    /// Binary protected attribute `X`.
    pub protected: String,
    /// Mediator columns `Z` (may be empty).
    pub mediators: Vec<String>,
    /// Confounder columns `W` (may be empty).
    pub confounders: Vec<String>,
    /// Numeric outcome `Y`.
    pub outcome: String,
    /// Reference level of `X`.
    pub x0: Level,
    /// Comparison level of `X`.
    pub x1: Level,
}

impl Variables {
    /// Variables with no mediators and no confounders.
    pub fn new(
        protected: impl Into<String>,
        outcome: impl Into<String>,
        x0: impl Into<Level>,
        x1: impl Into<Level>,
    ) -> Self {
        Self {
            protected: protected.into(),
            mediators: Vec::new(),
            confounders: Vec::new(),
            outcome: outcome.into(),
            x0: x0.into(),
            x1: x1.into(),
        }
    }

    /// Set the mediator columns. Blank names are dropped.
    pub fn mediators<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mediators = non_blank(names);
        self
    }

    /// Set the confounder columns. Blank names are dropped.
    pub fn confounders<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.confounders = non_blank(names);
        self
    }

    /// Check every role against `data` and borrow the numeric columns.
    pub fn prepare<'a>(&self, data: &'a Dataset) -> Result<PreparedData<'a>, DataError> {
        self.check_roles()?;

        let treated = data.binarize(&self.protected, &self.x0, &self.x1)?;

        let outcome = data.numeric(&self.outcome)?;
        if let Some(row) = outcome.iter().position(|y| !y.is_finite()) {
            return Err(DataError::NonFinite {
                column: self.outcome.clone(),
                row,
            });
        }

        let mediators = feature_columns(data, &self.mediators)?;
        let confounders = feature_columns(data, &self.confounders)?;

        Ok(PreparedData {
            treated,
            outcome,
            mediators,
            confounders,
            x0: self.x0.clone(),
            x1: self.x1.clone(),
        })
    }

    /// Reject a column named in more than one role.
    pub(crate) fn check_roles(&self) -> Result<(), DataError> {
        let mut seen: Vec<&str> = vec![self.protected.as_str()];
        let names = std::iter::once(&self.outcome)
            .chain(&self.mediators)
            .chain(&self.confounders);
        for name in names {
            if seen.contains(&name.as_str()) {
                return Err(DataError::RoleConflict(name.clone()));
            }
            seen.push(name.as_str());
        }
        Ok(())
    }
}

fn non_blank<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names
        .into_iter()
        .map(Into::into)
        .filter(|n: &String| !n.trim().is_empty())
        .collect()
}

fn feature_columns<'a>(data: &'a Dataset, names: &[String]) -> Result<Vec<&'a [f64]>, DataError> {
    names
        .iter()
        .map(|name| match data.column(name)? {
            Column::Numeric(v) => Ok(v.as_slice()),
            Column::Categorical(_) => Err(DataError::Categorical(name.clone())),
        })
        .collect()
}

/// Validated, read-only numeric view of a dataset.
///
/// Shared by every outer replicate; nothing here is mutated after
/// [`Variables::prepare`] returns.
#[derive(Debug, Clone)]
pub struct PreparedData<'a> {
    treated: Vec<bool>,
    outcome: &'a [f64],
    mediators: Vec<&'a [f64]>,
    confounders: Vec<&'a [f64]>,
    x0: Level,
    x1: Level,
}

impl<'a> PreparedData<'a> {
    /// Row count.
    pub fn n_rows(&self) -> usize {
        self.outcome.len()
    }

    /// `true` where the protected attribute is `x1`.
    pub fn treated(&self) -> &[bool] {
        &self.treated
    }

    /// Outcome values.
    pub fn outcome(&self) -> &'a [f64] {
        self.outcome
    }

    /// Reference level.
    pub fn x0(&self) -> &Level {
        &self.x0
    }

    /// Comparison level.
    pub fn x1(&self) -> &Level {
        &self.x1
    }

    /// Number of mediator columns.
    pub fn n_mediators(&self) -> usize {
        self.mediators.len()
    }

    /// Number of confounder columns.
    pub fn n_confounders(&self) -> usize {
        self.confounders.len()
    }

    /// Mediator features at `rows`, one matrix row per entry.
    pub fn mediator_features(&self, rows: &[usize]) -> DMatrix<f64> {
        gather(&self.mediators, rows)
    }

    /// Mediator then confounder features at `rows`.
    pub fn combined_features(&self, rows: &[usize]) -> DMatrix<f64> {
        let columns: Vec<&[f64]> = self
            .mediators
            .iter()
            .chain(&self.confounders)
            .copied()
            .collect();
        gather(&columns, rows)
    }
}

fn gather(columns: &[&[f64]], rows: &[usize]) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), columns.len(), |i, j| columns[j][rows[i]])
}
