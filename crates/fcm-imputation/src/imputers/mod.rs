//! Imputation module for handling missing values.
//!
//! This module provides:
//! - Fuzzy c-means imputation (the primary strategy)
//! - Statistical median/zero fallback for cells the clusters could not fill

mod fuzzy;
mod statistical;

pub use fuzzy::{FuzzyImputation, FuzzyImputer};
pub use statistical::StatisticalImputer;
