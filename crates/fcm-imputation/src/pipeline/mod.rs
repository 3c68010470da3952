//! Pipeline module.
//!
//! This module provides the imputation pipeline and its progress reporting.

mod builder;
pub mod progress;

pub use builder::{Imputer, ImputerBuilder};
pub use progress::{ClosureProgressReporter, ImputationStage, ProgressReporter, ProgressUpdate};
