//! Fuzzy c-means imputation.
//!
//! 1. Warm-start: replace missing numeric cells by their column mean
//! 2. Fit a soft clustering model on the warm-started matrix
//! 3. For every row with missing cells, copy the missing coordinates from the
//!    center of the row's dominant cluster
//! 4. Fill whatever is still missing with the column median (or 0)
//!
//! The warm-start matrix only feeds the optimizer and is dropped afterwards.
//! The imputer cannot tell masked cells from genuinely missing ones.

use super::StatisticalImputer;
use crate::cluster::{FuzzyCMeans, FuzzyPartition, SoftClustering};
use crate::error::{ImputationError, Result, ResultExt};
use crate::utils::{column_means, numeric_column_names, numeric_matrix, replace_numeric_column};
use polars::prelude::*;
use rand::RngCore;
use tracing::{debug, info, warn};

/// Output of [`FuzzyImputer::fit_transform`].
#[derive(Debug, Clone)]
pub struct FuzzyImputation {
    /// Table with every numeric cell filled.
    pub data: DataFrame,
    /// The fitted clustering model.
    pub partition: FuzzyPartition,
    /// Cells filled from a cluster center.
    pub cluster_filled: usize,
    /// Cells filled by the median/zero fallback.
    pub fallback_filled: usize,
    /// Human-readable log of what was filled where.
    pub processing_steps: Vec<String>,
}

pub struct FuzzyImputer<C: SoftClustering = FuzzyCMeans> {
    clusterer: C,
}

impl<C: SoftClustering> FuzzyImputer<C> {
    /// Create an imputer around a clustering model.
    pub fn new(clusterer: C) -> Self {
        Self { clusterer }
    }

    /// Fill every missing numeric cell of `df`.
    ///
    /// Non-numeric columns and numeric columns without missing values are
    /// returned untouched; numeric columns that had gaps come back as `Float64`.
    pub fn fit_transform(&self, df: &DataFrame, rng: &mut dyn RngCore) -> Result<FuzzyImputation> {
        self.fit_transform_with(df, rng, |_| {})
    }

    /// Like [`fit_transform`](Self::fit_transform), calling `on_fitted` once the
    /// clustering model is fitted and before any cell is written.
    pub fn fit_transform_with<F>(
        &self,
        df: &DataFrame,
        rng: &mut dyn RngCore,
        on_fitted: F,
    ) -> Result<FuzzyImputation>
    where
        F: FnOnce(&FuzzyPartition),
    {
        let numeric_cols = numeric_column_names(df);
        if numeric_cols.is_empty() {
            return Err(ImputationError::NoNumericColumns);
        }

        let matrix = numeric_matrix(df, &numeric_cols).context("Building numeric matrix")?;
        let means = column_means(&matrix, numeric_cols.len());
        let warm = Self::warm_start(&matrix, &means);

        let partition = self.clusterer.fit(&warm, rng)?;
        info!(
            "Fitted {} clusters in {} iterations (converged: {})",
            self.clusterer.n_clusters(),
            partition.iterations,
            partition.converged
        );
        on_fitted(&partition);

        let (filled, cluster_filled) = Self::fill_from_centers(&matrix, &partition);

        let mut result_df = df.clone();
        let mut processing_steps = Vec::new();

        for (col_idx, col_name) in numeric_cols.iter().enumerate() {
            let missing = matrix.iter().filter(|row| row[col_idx].is_none()).count();
            if missing == 0 {
                continue;
            }

            let from_centers = matrix
                .iter()
                .zip(&filled)
                .filter(|(before, after)| before[col_idx].is_none() && after[col_idx].is_some())
                .count();
            let values: Vec<Option<f64>> = filled.iter().map(|row| row[col_idx]).collect();
            replace_numeric_column(&mut result_df, col_name, values)
                .context(format!("Writing imputed column '{}'", col_name))?;

            debug!("Imputed {} cells in '{}' from cluster centers", from_centers, col_name);
            processing_steps.push(format!(
                "Imputed {} of {} missing cells in '{}' from cluster centers",
                from_centers, missing, col_name
            ));
        }

        let mut fallback_filled = 0;
        for col_name in &numeric_cols {
            let remaining = result_df
                .column(col_name)
                .context("Checking residual missing values")?
                .null_count();
            if remaining == 0 {
                continue;
            }

            warn!(
                "{} cells in '{}' could not be filled from clusters; using fallback",
                remaining, col_name
            );
            fallback_filled += StatisticalImputer::apply_median_or_zero(
                &mut result_df,
                col_name,
                &mut processing_steps,
            )
            .map_err(|e| ImputationError::Internal(e.to_string()))?;
        }

        Ok(FuzzyImputation {
            data: result_df,
            partition,
            cluster_filled,
            fallback_filled,
            processing_steps,
        })
    }

    /// Complete copy of `matrix` with gaps set to the column mean
    /// (0.0 for a column without values).
    fn warm_start(matrix: &[Vec<Option<f64>>], means: &[Option<f64>]) -> Vec<Vec<f64>> {
        matrix
            .iter()
            .map(|row| {
                row.iter()
                    .zip(means)
                    .map(|(value, mean)| value.or(*mean).unwrap_or(0.0))
                    .collect()
            })
            .collect()
    }

    /// Copy missing coordinates from each row's dominant cluster center.
    ///
    /// Rows without a dominant cluster and non-finite coordinates stay
    /// missing. Returns the filled matrix and the number of cells filled.
    fn fill_from_centers(
        matrix: &[Vec<Option<f64>>],
        partition: &FuzzyPartition,
    ) -> (Vec<Vec<Option<f64>>>, usize) {
        let mut filled = matrix.to_vec();
        let mut count = 0;

        for (row_idx, row) in filled.iter_mut().enumerate() {
            if row.iter().all(Option::is_some) {
                continue;
            }
            let Some(cluster) = partition.dominant_cluster(row_idx) else {
                continue;
            };
            let center = &partition.centers[cluster];

            for (value, &coordinate) in row.iter_mut().zip(center) {
                if value.is_none() && coordinate.is_finite() {
                    *value = Some(coordinate);
                    count += 1;
                }
            }
        }

        (filled, count)
    }
}
