//! Volatility profiles and their σ lookup tables
//!
//! Profiles are named levels; the numbers behind them are configuration,
//! so a scenario can recalibrate "moderate" without touching the engine.

use serde::{Deserialize, Serialize};

/// Named volatility level used by buckets, FX pairs, inflation and expenses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityProfile {
    /// No randomness; values follow their average
    Constant,
    #[serde(alias = "gov_bonds")]
    Mild,
    /// Broad equity index level
    #[default]
    #[serde(alias = "equity")]
    Moderate,
    #[serde(alias = "high_volatility")]
    Crazy,
}

/// σ value for each profile level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileSigmas {
    pub constant: f64,
    pub mild: f64,
    pub moderate: f64,
    pub crazy: f64,
}

impl ProfileSigmas {
    #[must_use]
    pub fn sigma(&self, profile: VolatilityProfile) -> f64 {
        match profile {
            VolatilityProfile::Constant => self.constant,
            VolatilityProfile::Mild => self.mild,
            VolatilityProfile::Moderate => self.moderate,
            VolatilityProfile::Crazy => self.crazy,
        }
    }

    fn values(&self) -> [(&'static str, f64); 4] {
        [
            ("constant", self.constant),
            ("mild", self.mild),
            ("moderate", self.moderate),
            ("crazy", self.crazy),
        ]
    }
}

/// Profile → σ mapping for every stochastic series in a path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityTable {
    /// Monthly σ of the log step for bucket prices and FX rates
    pub market: ProfileSigmas,
    /// Annualized σ of the inflation rate
    pub inflation: ProfileSigmas,
    /// σ of the monthly expense draw, relative to the period average
    pub expense: ProfileSigmas,
}

impl Default for VolatilityTable {
    fn default() -> Self {
        Self {
            market: ProfileSigmas {
                constant: 0.0,
                mild: 0.005,
                moderate: 0.04,
                crazy: 0.15,
            },
            inflation: ProfileSigmas {
                constant: 0.0,
                mild: 0.002,
                moderate: 0.006,
                crazy: 0.01,
            },
            expense: ProfileSigmas {
                constant: 0.0,
                mild: 0.01,
                moderate: 0.03,
                crazy: 0.08,
            },
        }
    }
}

impl VolatilityTable {
    /// Every (table, level, σ) triple, used by validation
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&'static str, &'static str, f64)> {
        let tables = [
            ("market", self.market.values()),
            ("inflation", self.inflation.values()),
            ("expense", self.expense.values()),
        ];
        tables
            .into_iter()
            .flat_map(|(table, values)| values.into_iter().map(move |(lvl, s)| (table, lvl, s)))
    }
}
