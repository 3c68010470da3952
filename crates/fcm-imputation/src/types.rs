use crate::error::Result;
use crate::evaluation::EvaluationReport;
use crate::validation::MissingnessWarnings;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

// ============================================================================
// Imputation Summary
// ============================================================================

/// What a single imputation run did.
///
/// Designed to be serialized next to the evaluation report so a caller can
/// show how much of the table was synthesized and how the optimizer behaved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImputationSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    /// Number of rows in the table.
    pub rows: usize,
    /// Number of columns in the table.
    pub columns: usize,
    /// Names of the numeric columns that took part in clustering.
    pub numeric_columns: Vec<String>,

    /// Numeric cells missing in the input, before masking.
    pub cells_missing: usize,
    /// Observed cells hidden for evaluation.
    pub cells_held_out: usize,
    /// Cells filled from a cluster center.
    pub cells_filled_from_clusters: usize,
    /// Cells filled by the median/zero fallback.
    pub cells_filled_by_fallback: usize,

    /// Number of clusters fitted.
    pub n_clusters: usize,
    /// Fuzziness exponent used.
    pub fuzziness: f64,
    /// Optimizer iterations performed.
    pub iterations: usize,
    /// Whether the optimizer reached its tolerance.
    pub converged: bool,
    /// Objective value at the final iteration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_objective: Option<f64>,
    /// Fuzzy partition coefficient of the fitted model.
    pub partition_coefficient: f64,

    /// Human-readable log of fill steps.
    pub processing_steps: Vec<String>,
}

impl ImputationSummary {
    /// Create a new empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of cells written by the imputer.
    pub fn cells_imputed(&self) -> usize {
        self.cells_filled_from_clusters + self.cells_filled_by_fallback
    }
}

// ============================================================================
// Results
// ============================================================================

/// Outcome of [`crate::Imputer::impute`].
#[derive(Debug, Clone)]
pub struct ImputationResult {
    /// The filled table, same shape and column order as the input.
    pub data: DataFrame,
    /// Held-out accuracy, absent when evaluation was not requested.
    pub evaluation: Option<EvaluationReport>,
    /// Advisory missingness warnings, computed on the input table.
    pub warnings: MissingnessWarnings,
    pub summary: ImputationSummary,
}

impl ImputationResult {
    /// Build a serializable report for this run.
    pub fn report(
        &self,
        input_file: impl Into<String>,
        output_file: Option<String>,
    ) -> ImputationReport {
        ImputationReport {
            input_file: input_file.into(),
            output_file,
            evaluation: self.evaluation,
            warning: self.warnings.message(),
            warnings: self.warnings.clone(),
            summary: self.summary.clone(),
        }
    }
}

/// JSON-friendly report of a run, as emitted by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImputationReport {
    pub input_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    /// `{ mae, rmse, n_test }`, omitted when evaluation was not requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationReport>,
    /// One-line warning text, omitted when there is nothing to warn about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub warnings: MissingnessWarnings,
    pub summary: ImputationSummary,
}

impl ImputationReport {
    /// Pretty-printed JSON, as written by `fcm-impute --json`.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
