//! Column-oriented tables and variable bookkeeping.
//!
//! The engine only needs numeric access to the outcome and the
//! mediator/confounder columns, plus a binary view of the protected attribute.
//! [`Dataset`] holds named numeric or categorical columns, [`Variables`] names
//! the roles, and [`Variables::prepare`] checks one against the other before
//! any resampling happens.
//!
//! # Example
//!
//! ```
//! use fairness_cookbook::data::{Dataset, Variables};
//!
//! let data = Dataset::new()
//!     .with_categorical("sex", ["a", "b", "a", "b"])?
//!     .with_numeric("income", vec![1.0, 3.0, 2.0, 4.0])?;
//!
//! let vars = Variables::new("sex", "income", "a", "b");
//! let prepared = vars.prepare(&data)?;
//! assert_eq!(prepared.n_rows(), 4);
//! # Ok::<(), fairness_cookbook::data::DataError>(())
//! ```

mod encoding;
mod variables;

pub use encoding::{CategoricalEncoder, IndicatorEncoder};
pub(crate) use encoding::needs_encoding;
pub use variables::{PreparedData, Variables};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a dataset does not fit the requested variables.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    /// No column with this name.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// A column with this name already exists.
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    /// Column length differs from the table's row count.
    #[error("column '{column}' has {got} rows, expected {expected}")]
    LengthMismatch {
        /// Offending column.
        column: String,
        /// Row count of the table.
        expected: usize,
        /// Row count of the column.
        got: usize,
    },

    /// A numeric column was required.
    #[error("column '{0}' is not numeric")]
    NotNumeric(String),

    /// The outcome holds NaN or an infinity.
    #[error("column '{column}' has a non-finite value at row {row}")]
    NonFinite {
        /// Offending column.
        column: String,
        /// First offending row.
        row: usize,
    },

    /// A protected-attribute level never occurs.
    #[error("level {level} does not occur in column '{column}'")]
    MissingLevel {
        /// Protected-attribute column.
        column: String,
        /// The absent level.
        level: Level,
    },

    /// A row matches neither level, so the attribute is not binary.
    #[error("row {row} of column '{column}' is '{value}', which is neither level")]
    AmbiguousLevel {
        /// Protected-attribute column.
        column: String,
        /// First offending row.
        row: usize,
        /// The value found there.
        value: String,
    },

    /// The two levels are the same value.
    #[error("both protected-attribute levels are {0}")]
    IdenticalLevels(Level),

    /// A text level was given for a numeric column or vice versa.
    #[error("level {level} cannot match column '{column}' of a different type")]
    LevelType {
        /// Protected-attribute column.
        column: String,
        /// The mismatched level.
        level: Level,
    },

    /// A column was assigned more than one role.
    #[error("column '{0}' is used in more than one role")]
    RoleConflict(String),

    /// A categorical mediator or confounder reached the numeric core.
    #[error("column '{0}' is categorical; enable auto_dummy or encode it first")]
    Categorical(String),
}

/// Values of one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Real-valued column.
    Numeric(Vec<f64>),
    /// Text labels.
    Categorical(Vec<String>),
}

impl Column {
    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Categorical(v) => v.len(),
        }
    }

    /// True if the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for [`Column::Categorical`].
    pub fn is_categorical(&self) -> bool {
        matches!(self, Column::Categorical(_))
    }

    /// Render one cell for messages.
    fn display_cell(&self, row: usize) -> String {
        match self {
            Column::Numeric(v) => v[row].to_string(),
            Column::Categorical(v) => v[row].clone(),
        }
    }
}

/// A level of the protected attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Level {
    /// Matches a categorical column.
    Text(String),
    /// Matches a numeric column (exact comparison).
    Number(f64),
}

impl Level {
    fn matches(&self, column: &Column, row: usize) -> bool {
        match (self, column) {
            (Level::Text(l), Column::Categorical(v)) => v[row] == *l,
            (Level::Number(l), Column::Numeric(v)) => v[row] == *l,
            _ => false,
        }
    }

    fn compatible_with(&self, column: &Column) -> bool {
        matches!(
            (self, column),
            (Level::Text(_), Column::Categorical(_)) | (Level::Number(_), Column::Numeric(_))
        )
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Text(s) => write!(f, "'{}'", s),
            Level::Number(x) => write!(f, "{}", x),
        }
    }
}

impl From<&str> for Level {
    fn from(s: &str) -> Self {
        Level::Text(s.to_string())
    }
}

impl From<String> for Level {
    fn from(s: String) -> Self {
        Level::Text(s)
    }
}

impl From<f64> for Level {
    fn from(x: f64) -> Self {
        Level::Number(x)
    }
}

impl From<i32> for Level {
    fn from(x: i32) -> Self {
        Level::Number(f64::from(x))
    }
}

/// A rectangular table of named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Dataset {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a numeric column.
    pub fn with_numeric(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self, DataError> {
        self.push_column(name, Column::Numeric(values))?;
        Ok(self)
    }

    /// Append a categorical column.
    pub fn with_categorical<I, S>(mut self, name: impl Into<String>, values: I) -> Result<Self, DataError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.push_column(name, Column::Categorical(values))?;
        Ok(self)
    }

    /// Append a column; its length must match the existing rows.
    pub fn push_column(&mut self, name: impl Into<String>, column: Column) -> Result<(), DataError> {
        let name = name.into();
        if self.names.iter().any(|n| *n == name) {
            return Err(DataError::DuplicateColumn(name));
        }
        if let Some(first) = self.columns.first() {
            if first.len() != column.len() {
                return Err(DataError::LengthMismatch {
                    column: name,
                    expected: first.len(),
                    got: column.len(),
                });
            }
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Number of rows (0 for a table without columns).
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Number of columns.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Result<&Column, DataError> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| DataError::UnknownColumn(name.to_string()))
    }

    /// Look up a numeric column by name.
    pub fn numeric(&self, name: &str) -> Result<&[f64], DataError> {
        match self.column(name)? {
            Column::Numeric(v) => Ok(v),
            Column::Categorical(_) => Err(DataError::NotNumeric(name.to_string())),
        }
    }

    /// Binary view of a protected attribute: `false` at `x0`, `true` at `x1`.
    ///
    /// Both levels must occur, must differ, and every row must hold one of them.
    pub fn binarize(&self, name: &str, x0: &Level, x1: &Level) -> Result<Vec<bool>, DataError> {
        if x0 == x1 {
            return Err(DataError::IdenticalLevels(x0.clone()));
        }
        let column = self.column(name)?;
        for level in [x0, x1] {
            if !level.compatible_with(column) {
                return Err(DataError::LevelType {
                    column: name.to_string(),
                    level: level.clone(),
                });
            }
        }

        let mut treated = Vec::with_capacity(column.len());
        for row in 0..column.len() {
            if x0.matches(column, row) {
                treated.push(false);
            } else if x1.matches(column, row) {
                treated.push(true);
            } else {
                return Err(DataError::AmbiguousLevel {
                    column: name.to_string(),
                    row,
                    value: column.display_cell(row),
                });
            }
        }

        if !treated.iter().any(|&t| !t) {
            return Err(DataError::MissingLevel {
                column: name.to_string(),
                level: x0.clone(),
            });
        }
        if !treated.iter().any(|&t| t) {
            return Err(DataError::MissingLevel {
                column: name.to_string(),
                level: x1.clone(),
            });
        }
        Ok(treated)
    }
}
