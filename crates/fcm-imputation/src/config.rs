//! Configuration types for fuzzy c-means imputation.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic imputer setup.

use serde::{Deserialize, Serialize};

/// How the fuzzy c-means optimizer picks its starting point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ClusterInit {
    /// Draw a random membership matrix and normalize each observation to sum to 1
    #[default]
    RandomPartition,
    /// Use randomly chosen distinct observations as the initial centers
    RandomSamples,
}

/// Configuration for the imputation pipeline.
///
/// Use [`ImputationConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use fcm_imputation::config::ImputationConfig;
///
/// let config = ImputationConfig::builder()
///     .n_clusters(3)
///     .fuzziness(2.0)
///     .test_fraction(0.2)
///     .seed(7)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImputationConfig {
    /// Number of fuzzy clusters. Must be less than the number of rows.
    /// Default: 5
    pub n_clusters: usize,

    /// Fuzziness exponent `m`. Accepted range is 1.1 to 5.
    /// Default: 2.0
    pub fuzziness: f64,

    /// Fraction of observed cells per numeric column held out for evaluation.
    /// Evaluation only runs when strictly between 0.0 and 1.0.
    /// Default: 0.1
    pub test_fraction: f64,

    /// Stop when the Frobenius norm of the membership change drops below this.
    /// Default: 0.005
    pub tolerance: f64,

    /// Upper bound on optimizer iterations.
    /// Default: 1000
    pub max_iterations: usize,

    /// Initialization scheme for the optimizer.
    /// Default: RandomPartition
    pub init: ClusterInit,

    /// Seed for the random source used by masking and clustering.
    /// If None, the source is seeded from OS entropy.
    /// Default: None
    pub seed: Option<u64>,

    /// Columns or rows with a missing share above this threshold are
    /// reported as warnings (0.0 - 1.0).
    /// Default: 0.8 (80%)
    pub missing_warning_threshold: f64,
}

impl Default for ImputationConfig {
    fn default() -> Self {
        Self {
            n_clusters: 5,
            fuzziness: 2.0,
            test_fraction: 0.1,
            tolerance: 0.005,
            max_iterations: 1000,
            init: ClusterInit::default(),
            seed: None,
            missing_warning_threshold: 0.8,
        }
    }
}

impl ImputationConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ImputationConfigBuilder {
        ImputationConfigBuilder::default()
    }

    /// Whether a held-out evaluation was requested.
    pub fn evaluation_requested(&self) -> bool {
        self.test_fraction > 0.0 && self.test_fraction < 1.0
    }

    /// Validate the configuration and return errors if invalid.
    ///
    /// Checks that depend on the table (cluster count against rows, the
    /// fuzziness range) are done by [`crate::validation::validate_input`].
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ConfigValidationError::InvalidTolerance(self.tolerance));
        }

        if self.max_iterations == 0 {
            return Err(ConfigValidationError::InvalidMaxIterations(
                self.max_iterations,
            ));
        }

        if !self.test_fraction.is_finite() {
            return Err(ConfigValidationError::InvalidTestFraction(
                self.test_fraction,
            ));
        }

        if !(0.0..=1.0).contains(&self.missing_warning_threshold) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "missing_warning_threshold".to_string(),
                value: self.missing_warning_threshold,
            });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid tolerance: {0} (must be a positive finite number)")]
    InvalidTolerance(f64),

    #[error("Invalid max iterations: {0} (must be at least 1)")]
    InvalidMaxIterations(usize),

    #[error("Invalid test fraction: {0} (must be a finite number)")]
    InvalidTestFraction(f64),
}

impl From<ConfigValidationError> for crate::error::ImputationError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::ImputationError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`ImputationConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ImputationConfigBuilder {
    n_clusters: Option<usize>,
    fuzziness: Option<f64>,
    test_fraction: Option<f64>,
    tolerance: Option<f64>,
    max_iterations: Option<usize>,
    init: Option<ClusterInit>,
    seed: Option<u64>,
    missing_warning_threshold: Option<f64>,
}

impl ImputationConfigBuilder {
    /// Set the number of fuzzy clusters.
    pub fn n_clusters(mut self, n_clusters: usize) -> Self {
        self.n_clusters = Some(n_clusters);
        self
    }

    /// Set the fuzziness exponent `m`.
    ///
    /// Values close to 1 approach hard clustering; larger values spread
    /// membership more evenly across clusters.
    pub fn fuzziness(mut self, m: f64) -> Self {
        self.fuzziness = Some(m);
        self
    }

    /// Set the held-out fraction used for evaluation.
    ///
    /// # Arguments
    /// * `fraction` - Value strictly between 0.0 and 1.0 enables evaluation;
    ///   0.0 or anything at or above 1.0 disables it.
    pub fn test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = Some(fraction);
        self
    }

    /// Set the convergence tolerance.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Set the iteration cap.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Set the initialization scheme.
    pub fn init(mut self, init: ClusterInit) -> Self {
        self.init = Some(init);
        self
    }

    /// Fix the random seed so runs are reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the missing-share threshold for warnings.
    pub fn missing_warning_threshold(mut self, threshold: f64) -> Self {
        self.missing_warning_threshold = Some(threshold);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ImputationConfig` or an error if validation fails.
    pub fn build(self) -> Result<ImputationConfig, ConfigValidationError> {
        let config = ImputationConfig {
            n_clusters: self.n_clusters.unwrap_or(5),
            fuzziness: self.fuzziness.unwrap_or(2.0),
            test_fraction: self.test_fraction.unwrap_or(0.1),
            tolerance: self.tolerance.unwrap_or(0.005),
            max_iterations: self.max_iterations.unwrap_or(1000),
            init: self.init.unwrap_or_default(),
            seed: self.seed,
            missing_warning_threshold: self.missing_warning_threshold.unwrap_or(0.8),
        };

        config.validate()?;
        Ok(config)
    }
}
