//! Soft clustering used by the imputation engine.
//!
//! The engine only depends on the [`SoftClustering`] trait, so the optimizer's
//! convergence rule or initialization scheme can be replaced without touching
//! the fill logic.
//!
//! ## Fuzzy c-means
//!
//! Every observation `x_i` belongs to every cluster `j` with a degree
//! `u_ji` in `[0, 1]`, the degrees of one observation summing to 1.
//!
//! **Objective**: minimize
//!
//! ```text
//! J_m = Σ_j Σ_i u_ji^m ||x_i - v_j||²
//! ```
//!
//! alternating between center updates and membership updates until the
//! membership matrix stops moving. The result is a local optimum and depends
//! on the random start.

mod fcm;

pub use fcm::FuzzyCMeans;

use crate::error::Result;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Common interface for soft clustering algorithms.
pub trait SoftClustering {
    /// Fit the model on a complete row-major matrix (rows = observations).
    ///
    /// All randomness is drawn from `rng`, so a seeded source gives
    /// reproducible partitions.
    fn fit(&self, data: &[Vec<f64>], rng: &mut dyn RngCore) -> Result<FuzzyPartition>;

    /// The configured number of clusters.
    fn n_clusters(&self) -> usize;
}

/// Output of a soft clustering run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzyPartition {
    /// One center per cluster, each a vector over the input columns.
    pub centers: Vec<Vec<f64>>,
    /// Membership degrees, indexed `[cluster][row]`.
    pub membership: Vec<Vec<f64>>,
    /// Objective value after every iteration.
    pub objective_history: Vec<f64>,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the tolerance was reached before the iteration cap.
    pub converged: bool,
}

impl FuzzyPartition {
    /// Number of observations covered by the membership matrix.
    pub fn n_rows(&self) -> usize {
        self.membership.first().map_or(0, Vec::len)
    }

    /// Cluster with the highest membership for `row`.
    ///
    /// Ties go to the lowest cluster index. Returns `None` when the row is
    /// out of range or every degree is NaN.
    pub fn dominant_cluster(&self, row: usize) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (cluster, degrees) in self.membership.iter().enumerate() {
            let degree = *degrees.get(row)?;
            if degree.is_nan() {
                continue;
            }
            match best {
                Some((_, best_degree)) if degree <= best_degree => {}
                _ => best = Some((cluster, degree)),
            }
        }
        best.map(|(cluster, _)| cluster)
    }

    /// Fuzzy partition coefficient, `Σ u² / N`.
    ///
    /// Ranges from `1 / c` for a uniform partition to 1 for a hard one.
    pub fn partition_coefficient(&self) -> f64 {
        let n = self.n_rows();
        if n == 0 {
            return 0.0;
        }
        let sum: f64 = self
            .membership
            .iter()
            .flat_map(|degrees| degrees.iter())
            .map(|u| u * u)
            .sum();
        sum / n as f64
    }

    /// Objective value at the last iteration.
    pub fn final_objective(&self) -> Option<f64> {
        self.objective_history.last().copied()
    }
}
