//! Statistical fallback imputation.
//!
//! Cluster-based filling can leave a cell empty (no dominant cluster, or a
//! non-finite center coordinate). Those leftovers are filled from the column
//! itself.

use crate::utils::fill_numeric_nulls;
use anyhow::Result;
use polars::prelude::*;

/// Statistical imputation methods for filling residual missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill remaining nulls in a numeric column with its median, or with 0.0
    /// when the column has no values to take a median of.
    ///
    /// Returns the number of cells filled.
    pub fn apply_median_or_zero(
        df: &mut DataFrame,
        col_name: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<usize> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let missing = series.null_count();
        if missing == 0 {
            return Ok(0);
        }

        let (fill_value, method) = match series.median() {
            Some(median) if median.is_finite() => (median, "median (fallback)"),
            _ => (0.0, "zero (fallback, median undefined)"),
        };

        Self::fill_with_value(df, col_name, fill_value, &series, processing_steps, method)?;
        Ok(missing)
    }

    /// Fill numeric column with a specific value.
    fn fill_with_value(
        df: &mut DataFrame,
        col_name: &str,
        fill_value: f64,
        series: &Series,
        processing_steps: &mut Vec<String>,
        method: &str,
    ) -> Result<()> {
        let filled = fill_numeric_nulls(series, fill_value)?;
        df.replace(col_name, filled)?;

        processing_steps.push(format!(
            "Filled {} cells in '{}' with {}: {:.2}",
            series.null_count(),
            col_name,
            method,
            fill_value
        ));

        Ok(())
    }
}
