//! Input validation and missingness warnings.
//!
//! Validation runs before anything random happens so that bad input is
//! rejected without touching the optimizer.

use crate::config::ImputationConfig;
use crate::error::{ImputationError, Result};
use crate::utils::{numeric_column_names, numeric_matrix};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Smallest accepted fuzziness exponent.
pub const MIN_FUZZINESS: f64 = 1.1;
/// Largest accepted fuzziness exponent.
pub const MAX_FUZZINESS: f64 = 5.0;

/// Check the table and parameters before imputation.
///
/// Checks run in this order: empty table, no numeric columns, all numeric
/// cells missing, cluster count, fuzziness.
pub fn validate_input(df: &DataFrame, config: &ImputationConfig) -> Result<()> {
    let rows = df.height();
    if rows == 0 {
        return Err(ImputationError::EmptyInput);
    }

    let numeric_cols = numeric_column_names(df);
    if numeric_cols.is_empty() {
        return Err(ImputationError::NoNumericColumns);
    }

    let matrix = numeric_matrix(df, &numeric_cols)?;
    if matrix.iter().flatten().all(Option::is_none) {
        return Err(ImputationError::AllNumericMissing);
    }

    if config.n_clusters == 0 || config.n_clusters >= rows {
        return Err(ImputationError::InvalidClusterCount {
            n_clusters: config.n_clusters,
            rows,
        });
    }

    if !(MIN_FUZZINESS..=MAX_FUZZINESS).contains(&config.fuzziness) {
        return Err(ImputationError::InvalidFuzziness(config.fuzziness));
    }

    Ok(())
}

/// Advisory notes about heavily missing numeric data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingnessWarnings {
    /// Numeric columns whose missing share exceeds the threshold.
    pub columns: Vec<String>,
    /// Rows whose missing share across numeric columns exceeds the threshold.
    pub rows: Vec<usize>,
}

impl MissingnessWarnings {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    /// One-line summary, `None` when there is nothing to report.
    pub fn message(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(format!(
            "Highly missing columns: {}; Highly missing rows: {}",
            self.columns.join(","),
            self.rows.len()
        ))
    }
}

/// Find numeric columns and rows whose missing share is above `threshold`.
pub fn missingness_warnings(df: &DataFrame, threshold: f64) -> Result<MissingnessWarnings> {
    let numeric_cols = numeric_column_names(df);
    if numeric_cols.is_empty() || df.height() == 0 {
        return Ok(MissingnessWarnings::default());
    }

    let matrix = numeric_matrix(df, &numeric_cols)?;
    let n_rows = matrix.len() as f64;
    let n_cols = numeric_cols.len() as f64;

    let columns: Vec<String> = numeric_cols
        .iter()
        .enumerate()
        .filter(|(col_idx, _)| {
            let missing = matrix.iter().filter(|row| row[*col_idx].is_none()).count();
            missing as f64 / n_rows > threshold
        })
        .map(|(_, name)| name.clone())
        .collect();

    let rows: Vec<usize> = matrix
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            let missing = row.iter().filter(|v| v.is_none()).count();
            missing as f64 / n_cols > threshold
        })
        .map(|(row_idx, _)| row_idx)
        .collect();

    let warnings = MissingnessWarnings { columns, rows };
    if let Some(message) = warnings.message() {
        warn!("{}", message);
    }
    Ok(warnings)
}
