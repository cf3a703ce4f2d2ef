//! Inflation and exchange-rate settings

use serde::{Deserialize, Serialize};

use super::volatility::VolatilityProfile;

/// Annual inflation assumptions in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InflationSettings {
    pub min_pct: f64,
    pub max_pct: f64,
    pub avg_pct: f64,
    #[serde(default = "mild_profile")]
    pub volatility: VolatilityProfile,
}

fn mild_profile() -> VolatilityProfile {
    VolatilityProfile::Mild
}

impl Default for InflationSettings {
    fn default() -> Self {
        Self {
            min_pct: 1.0,
            max_pct: 5.0,
            avg_pct: 2.5,
            volatility: VolatilityProfile::Mild,
        }
    }
}

impl InflationSettings {
    /// No inflation at all
    #[must_use]
    pub fn none() -> Self {
        Self {
            min_pct: 0.0,
            max_pct: 0.0,
            avg_pct: 0.0,
            volatility: VolatilityProfile::Constant,
        }
    }

    /// Fixed annual rate with no randomness
    #[must_use]
    pub fn fixed(pct: f64) -> Self {
        Self {
            min_pct: pct,
            max_pct: pct,
            avg_pct: pct,
            volatility: VolatilityProfile::Constant,
        }
    }
}

/// Exchange-rate settings for one non-home currency.
///
/// Rates are quoted as home-currency units per one unit of `code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxSettings {
    pub code: String,
    pub initial_rate: f64,
    pub min_rate: f64,
    pub max_rate: f64,
    pub avg_rate: f64,
    #[serde(default)]
    pub volatility: VolatilityProfile,
    /// Charged on every conversion into or out of this currency
    #[serde(default)]
    pub conversion_fee_pct: f64,
}

impl FxSettings {
    /// A pegged rate that never moves
    #[must_use]
    pub fn fixed(code: impl Into<String>, rate: f64) -> Self {
        Self {
            code: code.into(),
            initial_rate: rate,
            min_rate: rate,
            max_rate: rate,
            avg_rate: rate,
            volatility: VolatilityProfile::Constant,
            conversion_fee_pct: 0.0,
        }
    }
}
