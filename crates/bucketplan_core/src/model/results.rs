//! Monte Carlo configuration, progress tracking and aggregate results

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

fn default_percentiles() -> Vec<f64> {
    vec![0.10, 0.50, 0.90]
}

/// Batch parameters for a Monte Carlo run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    pub iterations: usize,
    /// Path `i` is simulated with seed `base_seed + i`
    pub base_seed: u64,
    /// Worker thread limit; 0 uses the rayon default
    #[serde(default)]
    pub concurrency: usize,
    /// Percentiles to report, as fractions in (0, 1)
    #[serde(default = "default_percentiles")]
    pub percentiles: Vec<f64>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            iterations: 1_000,
            base_seed: 0,
            concurrency: 0,
            percentiles: default_percentiles(),
        }
    }
}

impl MonteCarloConfig {
    #[must_use]
    pub fn path_seed(&self, index: usize) -> u64 {
        self.base_seed.wrapping_add(index as u64)
    }
}

/// Shared progress counter and cancellation flag for a batch.
///
/// Clones share the same atomics, so a reporting thread can hold one copy while the
/// runner holds another.
#[derive(Debug, Clone, Default)]
pub struct MonteCarloProgress {
    completed: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
}

impl MonteCarloProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn increment(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Whether every requested path made it into the aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Completeness {
    Full,
    /// The batch was cancelled; aggregates cover fully completed paths only
    Partial,
}

/// A path excluded from the aggregates because its simulation failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathFailure {
    pub index: usize,
    pub seed: u64,
    pub message: String,
}

/// Per-month percentile values across paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PercentileCurve {
    pub percentile: f64,
    pub total_value_home: Vec<f64>,
    pub net_spent: Vec<f64>,
    pub expense: Vec<f64>,
    /// Indexed by bucket, then by month
    pub bucket_values_home: Vec<Vec<f64>>,
}

/// Aggregate statistics of a Monte Carlo batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    pub requested: usize,
    /// Paths that ran to completion and entered the aggregates
    pub completed: usize,
    pub completeness: Completeness,
    pub success_count: usize,
    pub success_rate: f64,
    pub mean_final_value_home: f64,
    pub curves: Vec<PercentileCurve>,
    pub failures: Vec<PathFailure>,
}

impl MonteCarloSummary {
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.completeness == Completeness::Partial
    }

    /// Find the curve for a percentile, tolerating float noise in the key
    #[must_use]
    pub fn curve(&self, percentile: f64) -> Option<&PercentileCurve> {
        self.curves
            .iter()
            .find(|c| (c.percentile - percentile).abs() < 0.001)
    }
}
