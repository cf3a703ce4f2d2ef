//! Bucket, lot and trigger definitions
//!
//! A bucket is one asset class held in one currency. Its triggers form a
//! small rule language: each rule either sells the bucket into a standby
//! bucket or buys the bucket with money raised from a source bucket.

use serde::{Deserialize, Serialize};

use super::ids::BucketId;
use super::volatility::VolatilityProfile;

/// Accounting convention for attributing cost to a sale
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostBasisMethod {
    /// Oldest-acquired lots are sold first
    #[default]
    Fifo,
    /// Newest-acquired lots are sold first
    Lifo,
    /// A single running weighted-average lot
    Avco,
}

/// A purchase lot for cost basis tracking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub units: f64,
    /// Cost per unit in the bucket's currency
    pub unit_cost: f64,
    /// Month index (from path start) at which the lot was acquired
    pub acquired_month: u32,
}

impl Lot {
    #[must_use]
    pub fn cost(&self) -> f64 {
        self.units * self.unit_cost
    }
}

/// Annual growth assumptions in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthBounds {
    pub min_pct: f64,
    pub max_pct: f64,
    pub avg_pct: f64,
}

impl Default for GrowthBounds {
    fn default() -> Self {
        Self {
            min_pct: 0.0,
            max_pct: 0.0,
            avg_pct: 0.0,
        }
    }
}

/// How often a trigger is allowed to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerFrequency {
    #[default]
    Monthly,
    /// Only on months that are multiples of 12 from the path start
    Yearly,
}

impl TriggerFrequency {
    #[must_use]
    pub fn is_due(self, month: u32) -> bool {
        match self {
            TriggerFrequency::Monthly => true,
            TriggerFrequency::Yearly => month % 12 == 0,
        }
    }
}

/// Which pass of the trigger engine a rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSide {
    Sell,
    Buy,
}

/// A single rebalancing rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerRule {
    /// Sell when actual growth / target growth reaches `ratio`
    TakeProfit { ratio: f64, standby: BucketId },
    /// Sell when the bucket's share of the portfolio exceeds `max_share_pct`
    ShareExceeds { max_share_pct: f64, standby: BucketId },
    /// Buy when the price sits more than `min_discount_pct` below target
    Discount { min_discount_pct: f64, source: BucketId },
    /// Buy when the bucket's share of the portfolio drops below `min_share_pct`
    ShareBelow { min_share_pct: f64, source: BucketId },
}

impl TriggerRule {
    #[must_use]
    pub fn side(&self) -> TriggerSide {
        match self {
            TriggerRule::TakeProfit { .. } | TriggerRule::ShareExceeds { .. } => TriggerSide::Sell,
            TriggerRule::Discount { .. } | TriggerRule::ShareBelow { .. } => TriggerSide::Buy,
        }
    }

    /// The other bucket this rule moves money to or from
    #[must_use]
    pub fn counterparty(&self) -> BucketId {
        match *self {
            TriggerRule::TakeProfit { standby, .. } | TriggerRule::ShareExceeds { standby, .. } => {
                standby
            }
            TriggerRule::Discount { source, .. } | TriggerRule::ShareBelow { source, .. } => source,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            TriggerRule::TakeProfit { .. } => "take_profit",
            TriggerRule::ShareExceeds { .. } => "share_exceeds",
            TriggerRule::Discount { .. } => "discount",
            TriggerRule::ShareBelow { .. } => "share_below",
        }
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        match *self {
            TriggerRule::TakeProfit { ratio, .. } => ratio,
            TriggerRule::ShareExceeds { max_share_pct, .. } => max_share_pct,
            TriggerRule::Discount { min_discount_pct, .. } => min_discount_pct,
            TriggerRule::ShareBelow { min_share_pct, .. } => min_share_pct,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub rule: TriggerRule,
    #[serde(default)]
    pub frequency: TriggerFrequency,
}

impl Trigger {
    #[must_use]
    pub fn monthly(rule: TriggerRule) -> Self {
        Self {
            rule,
            frequency: TriggerFrequency::Monthly,
        }
    }

    #[must_use]
    pub fn yearly(rule: TriggerRule) -> Self {
        Self {
            rule,
            frequency: TriggerFrequency::Yearly,
        }
    }
}

fn default_required_runway_months() -> f64 {
    6.0
}

/// Static configuration of one investment bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketConfig {
    pub name: String,
    /// ISO currency code; must be the home currency or have FX settings
    pub currency: String,
    /// Price per unit at path start, in the bucket's currency
    pub initial_price: f64,
    pub initial_units: f64,
    #[serde(default)]
    pub growth: GrowthBounds,
    #[serde(default)]
    pub volatility: VolatilityProfile,
    /// Fee charged on both buys and sells, percent of the traded amount
    #[serde(default)]
    pub buy_sell_fee_pct: f64,
    #[serde(default)]
    pub cost_basis: CostBasisMethod,
    /// Annual growth the bucket is expected to follow; drives the target price
    #[serde(default)]
    pub target_growth_pct: f64,
    /// Months of expenses the bucket keeps when covering expenses
    #[serde(default)]
    pub cash_floor_months: f64,
    /// Months of expenses the bucket must hold before a trigger may sell it
    #[serde(default = "default_required_runway_months")]
    pub required_runway_months: f64,
    /// Lower ranks are sold first for expenses and visited first by triggers
    #[serde(default)]
    pub spending_priority: u32,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
}

impl BucketConfig {
    /// Target price after `months_elapsed` months on the target growth trajectory
    #[must_use]
    pub fn target_price(&self, months_elapsed: u32) -> f64 {
        let years = f64::from(months_elapsed) / 12.0;
        self.initial_price * (1.0 + self.target_growth_pct / 100.0).powf(years)
    }

    #[must_use]
    pub fn initial_value(&self) -> f64 {
        self.initial_price * self.initial_units
    }
}
