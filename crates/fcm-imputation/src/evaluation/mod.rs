//! Masking and evaluation harness.
//!
//! Before imputation a random sample of observed numeric cells is hidden;
//! after imputation the recovered values are compared against the hidden
//! originals. The imputer sees masked cells as ordinary missing values.
//!
//! # Example
//!
//! ```rust,ignore
//! use fcm_imputation::evaluation::{apply_mask, evaluate, select_holdout};
//!
//! let holdout = select_holdout(&df, 0.1, &mut rng)?;
//! let (masked, originals) = apply_mask(&df, &holdout)?;
//! let filled = impute(masked)?;
//! if let Some(report) = evaluate(&holdout, &originals, &filled)? {
//!     println!("MAE {:.3}, RMSE {:.3} over {} cells", report.mae, report.rmse, report.n_test);
//! }
//! ```

use crate::error::{ImputationError, Result};
use crate::utils::{column_values, numeric_column_names, replace_numeric_column};
use polars::prelude::*;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::debug;

/// A single cell of the table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub column: String,
}

impl CellRef {
    pub fn new(row: usize, column: impl Into<String>) -> Self {
        Self {
            row,
            column: column.into(),
        }
    }
}

/// Cells hidden from the imputer for evaluation.
///
/// Distinguishes "evaluation not requested" from "requested, but nothing was
/// eligible"; the two produce different reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoldoutSet {
    requested: bool,
    cells: Vec<CellRef>,
}

impl HoldoutSet {
    /// A holdout for a run where evaluation is disabled.
    pub fn not_requested() -> Self {
        Self::default()
    }

    /// Whether the caller asked for an evaluation.
    pub fn is_requested(&self) -> bool {
        self.requested
    }

    pub fn cells(&self) -> &[CellRef] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Accuracy of the imputed values on the held-out cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Mean absolute error.
    pub mae: f64,
    /// Root mean squared error.
    pub rmse: f64,
    /// Number of held-out cells evaluated.
    pub n_test: usize,
}

impl EvaluationReport {
    /// Report for a requested evaluation that had no eligible cells.
    pub fn empty() -> Self {
        Self {
            mae: 0.0,
            rmse: 0.0,
            n_test: 0,
        }
    }

    /// Compute MAE and RMSE from signed errors.
    pub fn from_errors(errors: &[f64]) -> Self {
        if errors.is_empty() {
            return Self::empty();
        }
        let n = errors.len() as f64;
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
        let mse = errors.iter().map(|e| e * e).sum::<f64>() / n;
        Self {
            mae,
            rmse: mse.sqrt(),
            n_test: errors.len(),
        }
    }
}

/// Pick the cells to hide.
///
/// For each numeric column, `max(1, floor(observed * fraction))` observed
/// cells are sampled without replacement (every observed cell when the
/// column has fewer). A fraction outside the open interval (0, 1) disables
/// evaluation and yields an empty, not-requested set.
pub fn select_holdout<R: Rng + ?Sized>(
    df: &DataFrame,
    fraction: f64,
    rng: &mut R,
) -> Result<HoldoutSet> {
    if !(fraction > 0.0 && fraction < 1.0) {
        debug!("Evaluation disabled (test_fraction = {})", fraction);
        return Ok(HoldoutSet::not_requested());
    }

    let mut cells = Vec::new();
    for col_name in numeric_column_names(df) {
        let eligible: Vec<usize> = column_values(df, &col_name)?
            .iter()
            .enumerate()
            .filter_map(|(row, value)| value.map(|_| row))
            .collect();

        let n_mask = ((eligible.len() as f64 * fraction).floor() as usize).max(1);
        let mut chosen: Vec<usize> = if eligible.len() > n_mask {
            eligible.choose_multiple(rng, n_mask).copied().collect()
        } else {
            eligible
        };
        chosen.sort_unstable();

        debug!("Holding out {} cells from '{}'", chosen.len(), col_name);
        cells.extend(chosen.into_iter().map(|row| CellRef::new(row, col_name.as_str())));
    }

    Ok(HoldoutSet {
        requested: true,
        cells,
    })
}

/// Hide the held-out cells in a copy of `df`.
///
/// Returns the masked copy and the original values, aligned with
/// [`HoldoutSet::cells`]. Masked columns come back as `Float64`.
pub fn apply_mask(df: &DataFrame, holdout: &HoldoutSet) -> Result<(DataFrame, Vec<f64>)> {
    let mut masked = df.clone();
    if holdout.is_empty() {
        return Ok((masked, Vec::new()));
    }

    let mut columns: HashMap<&str, Vec<Option<f64>>> = HashMap::new();
    let mut originals = Vec::with_capacity(holdout.len());

    for cell in holdout.cells() {
        let values = match columns.entry(cell.column.as_str()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(
                column_values(df, &cell.column)
                    .map_err(|_| ImputationError::ColumnNotFound(cell.column.clone()))?,
            ),
        };

        // `take` also rejects a cell listed twice.
        let original = values
            .get_mut(cell.row)
            .and_then(Option::take)
            .ok_or_else(|| {
                ImputationError::Internal(format!(
                    "held-out cell (row {}, '{}') has no observed value",
                    cell.row, cell.column
                ))
            })?;
        originals.push(original);
    }

    for (col_name, values) in columns {
        replace_numeric_column(&mut masked, col_name, values)?;
    }

    Ok((masked, originals))
}

/// Score the filled table on the held-out cells.
///
/// - evaluation not requested: `None`
/// - requested but nothing held out: a zero report
/// - otherwise MAE / RMSE over the held-out cells
pub fn evaluate(
    holdout: &HoldoutSet,
    original_values: &[f64],
    filled: &DataFrame,
) -> Result<Option<EvaluationReport>> {
    if !holdout.is_requested() {
        return Ok(None);
    }
    if holdout.is_empty() {
        return Ok(Some(EvaluationReport::empty()));
    }
    if original_values.len() != holdout.len() {
        return Err(ImputationError::Internal(format!(
            "{} original values for {} held-out cells",
            original_values.len(),
            holdout.len()
        )));
    }

    let mut columns: HashMap<&str, Vec<Option<f64>>> = HashMap::new();
    let mut errors = Vec::with_capacity(holdout.len());

    for (cell, original) in holdout.cells().iter().zip(original_values) {
        let values = match columns.entry(cell.column.as_str()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(
                column_values(filled, &cell.column)
                    .map_err(|_| ImputationError::ColumnNotFound(cell.column.clone()))?,
            ),
        };

        let recovered = values.get(cell.row).copied().flatten().ok_or_else(|| {
            ImputationError::Internal(format!(
                "held-out cell (row {}, '{}') was not filled",
                cell.row, cell.column
            ))
        })?;
        errors.push(original - recovered);
    }

    Ok(Some(EvaluationReport::from_errors(&errors)))
}
