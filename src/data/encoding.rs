//! Indicator encoding of categorical mediators and confounders.

use std::collections::BTreeSet;

use super::{Column, DataError, Dataset};

/// Turns categorical columns into numeric ones.
///
/// Implementations return the adjusted table together with the adjusted list
/// of column names that should replace `columns` in the variable roles.
pub trait CategoricalEncoder: Send + Sync {
    /// Encode the categorical members of `columns`.
    fn encode(&self, data: &Dataset, columns: &[String]) -> Result<(Dataset, Vec<String>), DataError>;
}

/// One 0/1 column per level, in sorted level order.
///
/// An encoded column `c` with levels `{"m", "n", "o"}` becomes `c_m`, `c_n`
/// and `c_o`, so a single-level column still yields one (constant) feature.
/// Numeric columns pass through.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorEncoder;

impl CategoricalEncoder for IndicatorEncoder {
    fn encode(&self, data: &Dataset, columns: &[String]) -> Result<(Dataset, Vec<String>), DataError> {
        let mut out = Dataset::new();
        let mut renamed: Vec<(String, Vec<String>)> = Vec::new();

        for (name, column) in data.names.iter().zip(&data.columns) {
            let requested = columns.contains(name);
            match column {
                Column::Categorical(values) if requested => {
                    let levels: BTreeSet<&str> = values.iter().map(String::as_str).collect();
                    let mut indicators = Vec::new();
                    for level in &levels {
                        let indicator_name = format!("{}_{}", name, level);
                        let indicator = values
                            .iter()
                            .map(|v| if v.as_str() == *level { 1.0 } else { 0.0 })
                            .collect();
                        out.push_column(indicator_name.clone(), Column::Numeric(indicator))?;
                        indicators.push(indicator_name);
                    }
                    tracing::debug!(
                        column = %name,
                        levels = levels.len(),
                        indicators = indicators.len(),
                        "encoded categorical column"
                    );
                    renamed.push((name.clone(), indicators));
                }
                _ => out.push_column(name.clone(), column.clone())?,
            }
        }

        let mut adjusted = Vec::with_capacity(columns.len());
        for name in columns {
            match renamed.iter().find(|(original, _)| original == name) {
                Some((_, indicators)) => adjusted.extend(indicators.iter().cloned()),
                None => {
                    data.column(name)?;
                    adjusted.push(name.clone());
                }
            }
        }
        Ok((out, adjusted))
    }
}

/// True if any of `columns` is categorical in `data`.
pub(crate) fn needs_encoding(data: &Dataset, columns: &[String]) -> bool {
    columns
        .iter()
        .any(|name| data.column(name).map_or(false, Column::is_categorical))
}
