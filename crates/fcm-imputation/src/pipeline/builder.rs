//! The imputation pipeline and its builder.

use crate::cluster::FuzzyCMeans;
use crate::config::{ConfigValidationError, ImputationConfig};
use crate::error::{Result, ResultExt};
use crate::evaluation::{apply_mask, evaluate, select_holdout};
use crate::imputers::FuzzyImputer;
use crate::pipeline::progress::{
    ClosureProgressReporter, ImputationStage, ProgressReporter, ProgressUpdate,
};
use crate::types::{ImputationResult, ImputationSummary};
use crate::utils::{numeric_column_names, numeric_matrix};
use crate::validation::{missingness_warnings, validate_input};
use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Fills missing numeric values with fuzzy c-means and scores the result on
/// held-out cells.
///
/// Use [`Imputer::builder()`] to create an imputer with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use fcm_imputation::{ImputationConfig, Imputer};
///
/// let config = ImputationConfig::builder()
///     .n_clusters(3)
///     .test_fraction(0.2)
///     .seed(42)
///     .build()?;
///
/// let result = Imputer::builder()
///     .config(config)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .impute(dataframe)?;
///
/// if let Some(report) = result.evaluation {
///     println!("MAE {:.3}, RMSE {:.3}", report.mae, report.rmse);
/// }
/// ```
pub struct Imputer {
    config: ImputationConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// Imputer holds no per-run state and may be shared across threads
static_assertions::assert_impl_all!(Imputer: Send, Sync);

impl Imputer {
    /// Create a new imputer builder.
    pub fn builder() -> ImputerBuilder {
        ImputerBuilder::default()
    }

    /// The configuration this imputer runs with.
    pub fn config(&self) -> &ImputationConfig {
        &self.config
    }

    /// Run the full pipeline on `df`.
    ///
    /// The input is not modified. The returned table has the same shape and
    /// column order; numeric columns that had gaps come back as `Float64`.
    ///
    /// # Errors
    ///
    /// Validation errors (empty table, no numeric columns, every numeric
    /// cell missing, bad cluster count, bad fuzziness) are returned before
    /// any random draw is made.
    pub fn impute(&self, df: DataFrame) -> Result<ImputationResult> {
        match self.impute_internal(df) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Imputation completed successfully"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Imputation error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    /// Random source for one run: seeded when configured, OS entropy otherwise.
    fn make_rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn impute_internal(&self, df: DataFrame) -> Result<ImputationResult> {
        let start_time = Instant::now();

        info!("Starting imputation...");

        // Step 1: Validation
        self.report_progress(ProgressUpdate::new(
            ImputationStage::Validating,
            0.0,
            "Validating input...",
        ));
        validate_input(&df, &self.config)?;
        let warnings = missingness_warnings(&df, self.config.missing_warning_threshold)?;

        let numeric_cols = numeric_column_names(&df);
        let cells_missing = numeric_matrix(&df, &numeric_cols)
            .context("Counting missing cells")?
            .iter()
            .flatten()
            .filter(|v| v.is_none())
            .count();
        debug!(
            "Input shape {:?}, {} numeric columns, {} missing cells",
            df.shape(),
            numeric_cols.len(),
            cells_missing
        );

        self.report_progress(ProgressUpdate::new(
            ImputationStage::Validating,
            1.0,
            "Input is valid",
        ));

        let mut rng = self.make_rng();

        // Step 2: Masking
        self.report_progress(ProgressUpdate::new(
            ImputationStage::Masking,
            0.0,
            "Selecting held-out cells...",
        ));
        let holdout = select_holdout(&df, self.config.test_fraction, &mut rng)?;
        let (masked, original_values) = apply_mask(&df, &holdout)?;
        let masking_message = if self.config.evaluation_requested() {
            format!("Held out {} cells for evaluation", holdout.len())
        } else {
            format!(
                "Evaluation not requested (test_fraction = {})",
                self.config.test_fraction
            )
        };
        info!("{}", masking_message);
        self.report_progress(ProgressUpdate::new(
            ImputationStage::Masking,
            1.0,
            masking_message,
        ));

        // Step 3: Clustering and filling
        self.report_progress(ProgressUpdate::new(
            ImputationStage::Clustering,
            0.0,
            format!("Fitting {} fuzzy clusters...", self.config.n_clusters),
        ));
        let imputer = FuzzyImputer::new(FuzzyCMeans::from_config(&self.config));
        let imputation = imputer.fit_transform_with(&masked, &mut rng, |partition| {
            self.report_progress(ProgressUpdate::new(
                ImputationStage::Clustering,
                1.0,
                format!("Fitted in {} iterations", partition.iterations),
            ));
            self.report_progress(ProgressUpdate::new(
                ImputationStage::Filling,
                0.0,
                "Filling missing cells...",
            ));
        })?;
        self.report_progress(ProgressUpdate::new(
            ImputationStage::Filling,
            1.0,
            format!(
                "Filled {} cells",
                imputation.cluster_filled + imputation.fallback_filled
            ),
        ));

        // Step 4: Evaluation
        self.report_progress(ProgressUpdate::new(
            ImputationStage::Evaluating,
            0.0,
            "Scoring held-out cells...",
        ));
        let evaluation = evaluate(&holdout, &original_values, &imputation.data)?;
        if let Some(report) = &evaluation {
            info!(
                "Evaluation on {} cells: MAE = {:.4}, RMSE = {:.4}",
                report.n_test, report.mae, report.rmse
            );
        }

        let partition = &imputation.partition;
        let summary = ImputationSummary {
            duration_ms: start_time.elapsed().as_millis() as u64,
            rows: df.height(),
            columns: df.width(),
            numeric_columns: numeric_cols,
            cells_missing,
            cells_held_out: holdout.len(),
            cells_filled_from_clusters: imputation.cluster_filled,
            cells_filled_by_fallback: imputation.fallback_filled,
            n_clusters: self.config.n_clusters,
            fuzziness: self.config.fuzziness,
            iterations: partition.iterations,
            converged: partition.converged,
            final_objective: partition.final_objective(),
            partition_coefficient: partition.partition_coefficient(),
            processing_steps: imputation.processing_steps.clone(),
        };

        info!(
            "Imputation finished in {} ms ({} cells imputed)",
            summary.duration_ms,
            summary.cells_imputed()
        );

        Ok(ImputationResult {
            data: imputation.data,
            evaluation,
            warnings,
            summary,
        })
    }
}

/// Builder for creating an [`Imputer`].
#[derive(Default)]
pub struct ImputerBuilder {
    config: Option<ImputationConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(ImputerBuilder: Send);

impl ImputerBuilder {
    /// Set the imputation configuration.
    pub fn config(mut self, config: ImputationConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during imputation.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use fcm_imputation::{ProgressReporter, ProgressUpdate};
    /// use std::sync::Arc;
    ///
    /// struct StderrReporter;
    ///
    /// impl ProgressReporter for StderrReporter {
    ///     fn report(&self, update: ProgressUpdate) {
    ///         eprintln!("{}: {}", update.stage.display_name(), update.message);
    ///     }
    /// }
    ///
    /// let imputer = Imputer::builder()
    ///     .progress_reporter(Arc::new(StderrReporter))
    ///     .build()?;
    /// ```
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For reusable reporters, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the imputer.
    ///
    /// Returns an error if the configuration is invalid. The cluster count
    /// and fuzziness depend on the table and are checked by
    /// [`Imputer::impute`].
    pub fn build(self) -> std::result::Result<Imputer, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Imputer {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}
