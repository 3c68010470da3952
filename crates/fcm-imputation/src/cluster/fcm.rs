//! Fuzzy c-means optimizer.
//!
//! Alternating optimization in the style of Bezdek's algorithm:
//!
//! 1. Initialize the membership matrix (random partition or random samples)
//! 2. Compute centers as membership-weighted means
//! 3. Recompute memberships from inverse relative distances
//! 4. Repeat until the membership change falls below the tolerance or the
//!    iteration cap is hit
//!
//! Hitting the cap is not an error; the last state is returned with
//! `converged = false`.

use super::{FuzzyPartition, SoftClustering};
use crate::config::{ClusterInit, ImputationConfig};
use crate::error::{ImputationError, Result};
use rand::{Rng, RngCore};
use tracing::{debug, warn};

/// Floor applied to memberships and distances to keep powers and ratios finite.
const EPSILON: f64 = f64::EPSILON;

/// Fuzzy c-means clustering.
///
/// # Performance
///
/// - Time complexity: O(n·c²·d·i) where n=rows, c=clusters, d=features, i=iterations
/// - Space complexity: O(n·c)
#[derive(Debug, Clone)]
pub struct FuzzyCMeans {
    n_clusters: usize,
    fuzziness: f64,
    tolerance: f64,
    max_iterations: usize,
    init: ClusterInit,
}

impl FuzzyCMeans {
    /// Create a new optimizer with the default tolerance (0.005) and
    /// iteration cap (1000).
    pub fn new(n_clusters: usize, fuzziness: f64) -> Self {
        Self {
            n_clusters,
            fuzziness,
            tolerance: 0.005,
            max_iterations: 1000,
            init: ClusterInit::default(),
        }
    }

    /// Build an optimizer from the imputation configuration.
    pub fn from_config(config: &ImputationConfig) -> Self {
        Self::new(config.n_clusters, config.fuzziness)
            .with_tolerance(config.tolerance)
            .with_max_iterations(config.max_iterations)
            .with_init(config.init)
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_init(mut self, init: ClusterInit) -> Self {
        self.init = init;
        self
    }

    /// Reject input the optimizer cannot work with. Returns the feature count.
    fn check_input(&self, data: &[Vec<f64>]) -> Result<usize> {
        if data.is_empty() {
            return Err(ImputationError::EmptyInput);
        }
        if self.n_clusters == 0 || self.n_clusters > data.len() {
            return Err(ImputationError::InvalidClusterCount {
                n_clusters: self.n_clusters,
                rows: data.len(),
            });
        }
        if !self.fuzziness.is_finite() || self.fuzziness <= 1.0 {
            return Err(ImputationError::InvalidFuzziness(self.fuzziness));
        }

        let n_features = data[0].len();
        if n_features == 0 {
            return Err(ImputationError::Internal(
                "clustering matrix has no columns".to_string(),
            ));
        }
        for (row_idx, row) in data.iter().enumerate() {
            if row.len() != n_features {
                return Err(ImputationError::Internal(format!(
                    "row {} has {} values, expected {}",
                    row_idx,
                    row.len(),
                    n_features
                )));
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(ImputationError::Internal(format!(
                    "row {} contains a non-finite value",
                    row_idx
                )));
            }
        }

        Ok(n_features)
    }

    fn initial_membership(&self, data: &[Vec<f64>], rng: &mut dyn RngCore) -> Vec<Vec<f64>> {
        match self.init {
            ClusterInit::RandomPartition => {
                let mut membership: Vec<Vec<f64>> = (0..self.n_clusters)
                    .map(|_| (0..data.len()).map(|_| rng.r#gen::<f64>()).collect())
                    .collect();
                normalize_columns(&mut membership);
                membership
            }
            ClusterInit::RandomSamples => {
                let centers: Vec<Vec<f64>> =
                    rand::seq::index::sample(rng, data.len(), self.n_clusters)
                        .into_iter()
                        .map(|row| data[row].clone())
                        .collect();
                self.update_membership(&distances(data, &centers))
            }
        }
    }

    /// Membership degrees raised to the fuzziness exponent.
    fn weights(&self, membership: &[Vec<f64>]) -> Vec<Vec<f64>> {
        membership
            .iter()
            .map(|degrees| {
                degrees
                    .iter()
                    .map(|u| u.max(EPSILON).powf(self.fuzziness))
                    .collect()
            })
            .collect()
    }

    /// `u_ji = 1 / Σ_k (d_ji / d_ki)^(2 / (m - 1))`
    fn update_membership(&self, distances: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let exponent = 2.0 / (self.fuzziness - 1.0);
        let n_rows = distances.first().map_or(0, Vec::len);
        let mut membership = vec![vec![0.0; n_rows]; self.n_clusters];

        for row in 0..n_rows {
            for (cluster, degrees) in membership.iter_mut().enumerate() {
                let d = distances[cluster][row];
                let denom: f64 = distances
                    .iter()
                    .map(|other| (d / other[row]).powf(exponent))
                    .sum();
                degrees[row] = 1.0 / denom;
            }
        }

        membership
    }
}

impl SoftClustering for FuzzyCMeans {
    fn fit(&self, data: &[Vec<f64>], rng: &mut dyn RngCore) -> Result<FuzzyPartition> {
        let n_features = self.check_input(data)?;
        debug!(
            "Fitting fuzzy c-means: {} rows, {} features, c={}, m={}",
            data.len(),
            n_features,
            self.n_clusters,
            self.fuzziness
        );

        let mut membership = self.initial_membership(data, rng);
        let mut centers = Vec::new();
        let mut objective_history = Vec::new();
        let mut iterations = 0;
        let mut converged = false;

        for iteration in 1..=self.max_iterations {
            let weights = self.weights(&membership);
            centers = weighted_centers(data, &weights, n_features);
            let dist = distances(data, &centers);
            objective_history.push(objective(&weights, &dist));

            let next = self.update_membership(&dist);
            let change = frobenius_distance(&membership, &next);
            membership = next;
            iterations = iteration;

            if iteration % 100 == 0 {
                debug!("Iteration {}: membership change {:.6}", iteration, change);
            }
            if change < self.tolerance {
                converged = true;
                break;
            }
        }

        if converged {
            debug!("Fuzzy c-means converged after {} iterations", iterations);
        } else {
            warn!(
                "Fuzzy c-means did not converge within {} iterations; using last state",
                self.max_iterations
            );
        }

        Ok(FuzzyPartition {
            centers,
            membership,
            objective_history,
            iterations,
            converged,
        })
    }

    fn n_clusters(&self) -> usize {
        self.n_clusters
    }
}

/// Scale each observation's degrees so they sum to 1.
fn normalize_columns(membership: &mut [Vec<f64>]) {
    let n_rows = membership.first().map_or(0, Vec::len);
    for row in 0..n_rows {
        let total: f64 = membership.iter().map(|degrees| degrees[row]).sum();
        if total > 0.0 {
            for degrees in membership.iter_mut() {
                degrees[row] /= total;
            }
        } else {
            let uniform = 1.0 / membership.len() as f64;
            for degrees in membership.iter_mut() {
                degrees[row] = uniform;
            }
        }
    }
}

fn weighted_centers(data: &[Vec<f64>], weights: &[Vec<f64>], n_features: usize) -> Vec<Vec<f64>> {
    weights
        .iter()
        .map(|w| {
            let mut center = vec![0.0; n_features];
            let mut total = 0.0;
            for (row, &weight) in data.iter().zip(w) {
                for (c, x) in center.iter_mut().zip(row) {
                    *c += weight * x;
                }
                total += weight;
            }
            for c in center.iter_mut() {
                *c /= total;
            }
            center
        })
        .collect()
}

/// Euclidean distances indexed `[cluster][row]`, floored at `EPSILON`.
fn distances(data: &[Vec<f64>], centers: &[Vec<f64>]) -> Vec<Vec<f64>> {
    centers
        .iter()
        .map(|center| {
            data.iter()
                .map(|row| {
                    row.iter()
                        .zip(center)
                        .map(|(x, c)| (x - c) * (x - c))
                        .sum::<f64>()
                        .sqrt()
                        .max(EPSILON)
                })
                .collect()
        })
        .collect()
}

fn objective(weights: &[Vec<f64>], distances: &[Vec<f64>]) -> f64 {
    weights
        .iter()
        .zip(distances)
        .flat_map(|(w, d)| w.iter().zip(d).map(|(w, d)| w * d * d))
        .sum()
}

fn frobenius_distance(a: &[Vec<f64>], b: &[Vec<f64>]) -> f64 {
    a.iter()
        .zip(b)
        .flat_map(|(x, y)| x.iter().zip(y).map(|(x, y)| (x - y) * (x - y)))
        .sum::<f64>()
        .sqrt()
}
