//! Fuzzy C-Means Imputation Library
//!
//! Fills missing numeric values in tabular data using fuzzy c-means
//! clustering, built with Rust and Polars.
//!
//! # Overview
//!
//! - **Fuzzy Imputation**: every row gets a soft membership in each cluster;
//!   missing cells are copied from the center of the row's dominant cluster
//! - **Fallback**: cells the clusters cannot fill get the column median (or 0)
//! - **Evaluation**: a random share of observed cells is hidden before
//!   imputation and scored afterwards with MAE and RMSE
//! - **Missingness Warnings**: columns and rows that are mostly empty are flagged
//! - **Progress Reporting**: stage-by-stage progress updates
//!
//! Non-numeric columns pass through unchanged.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use fcm_imputation::{ImputationConfig, Imputer, io};
//!
//! let df = io::load_table("blood_sample.csv")?;
//!
//! let config = ImputationConfig::builder()
//!     .n_clusters(3)
//!     .fuzziness(2.0)
//!     .test_fraction(0.1)
//!     .seed(42)
//!     .build()?;
//!
//! let result = Imputer::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .impute(df)?;
//!
//! if let Some(report) = result.evaluation {
//!     println!("MAE {:.4}, RMSE {:.4} on {} cells", report.mae, report.rmse, report.n_test);
//! }
//! if let Some(warning) = result.warnings.message() {
//!     println!("{}", warning);
//! }
//! ```
//!
//! # Lower-level pieces
//!
//! The pipeline is assembled from parts that can be used on their own:
//!
//! - [`evaluation`]: held-out selection, masking and scoring
//! - [`imputers::FuzzyImputer`]: warm start, clustering and fill
//! - [`cluster::FuzzyCMeans`]: the optimizer, behind the [`cluster::SoftClustering`] trait
//! - [`validation`]: input checks and missingness warnings

pub mod cluster;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod imputers;
pub mod io;
pub mod pipeline;
pub mod types;
pub mod utils;
pub mod validation;

// Re-exports for convenient access
pub use cluster::{FuzzyCMeans, FuzzyPartition, SoftClustering};
pub use config::{ClusterInit, ConfigValidationError, ImputationConfig, ImputationConfigBuilder};
pub use error::{ImputationError, ResultExt};
pub use evaluation::{CellRef, EvaluationReport, HoldoutSet, apply_mask, evaluate, select_holdout};
pub use imputers::{FuzzyImputation, FuzzyImputer, StatisticalImputer};
pub use pipeline::{
    ClosureProgressReporter, ImputationStage, Imputer, ImputerBuilder, ProgressReporter,
    ProgressUpdate,
};
pub use types::{ImputationReport, ImputationResult, ImputationSummary};
pub use utils::{fill_numeric_nulls, is_numeric_dtype, numeric_column_names};
pub use validation::{MissingnessWarnings, missingness_warnings, validate_input};
