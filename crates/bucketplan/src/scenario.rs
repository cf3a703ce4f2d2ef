//! YAML scenario files
//!
//! A scenario bundles the simulation configuration with optional Monte Carlo
//! batch parameters. Everything except the buckets has a default, so a
//! minimal scenario is a list of buckets and an expense.

use std::path::Path;

use bucketplan_core::SimulationConfig;
use bucketplan_core::model::MonteCarloConfig;
use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub monte_carlo: Option<MonteCarloConfig>,
}

impl Scenario {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_saphyr::Error> {
        serde_saphyr::from_str(yaml)
    }

    /// Save to YAML string
    pub fn to_yaml(&self) -> Result<String, serde_saphyr::ser::Error> {
        serde_saphyr::to_string(self)
    }

    /// Read and parse a scenario file
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read scenario {}", path.display()))?;
        let scenario = Self::from_yaml(&yaml)
            .wrap_err_with(|| format!("failed to parse scenario {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            buckets = scenario.simulation.buckets.len(),
            months = scenario.simulation.duration_months,
            "scenario loaded"
        );
        Ok(scenario)
    }

    /// Monte Carlo settings from the file, with command-line overrides applied
    pub fn monte_carlo_config(
        &self,
        iterations: Option<usize>,
        seed: Option<u64>,
        threads: Option<usize>,
    ) -> MonteCarloConfig {
        let mut config = self.monte_carlo.clone().unwrap_or_default();
        if let Some(iterations) = iterations {
            config.iterations = iterations;
        }
        if let Some(seed) = seed {
            config.base_seed = seed;
        }
        if let Some(threads) = threads {
            config.concurrency = threads;
        }
        config
    }
}
