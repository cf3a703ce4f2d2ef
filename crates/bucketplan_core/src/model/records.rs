//! Per-month output rows for a single simulated path
//!
//! A `PathResult` is produced once when the path completes and is never
//! mutated afterwards. Amounts labelled `_home` are in the home currency;
//! everything else is in the bucket's own currency.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::ids::BucketId;

/// One bucket's state and activity during one month
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketMonthRecord {
    pub price: f64,
    pub price_home: f64,
    /// Units held at month end
    pub units: f64,
    pub value: f64,
    pub value_home: f64,
    /// Gross value sold this month (triggers and expense coverage)
    pub sold: f64,
    pub sold_home: f64,
    /// Value invested this month after buy fees
    pub bought: f64,
    /// Trading and conversion fees attributed to this bucket
    pub fees_home: f64,
    pub tax_home: f64,
    /// Contribution of this bucket toward the month's expense
    pub net_spent_home: f64,
}

/// One simulated month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthRecord {
    /// 0-based month index
    pub month: u32,
    pub date: Date,
    /// Monthly inflation rate as a fraction
    pub inflation_rate: f64,
    pub cumulative_inflation: f64,
    pub expense: f64,
    /// Total paid toward `expense`, never above it
    pub net_spent: f64,
    /// Portion of `net_spent` paid from the cash reserve
    pub cash_spent: f64,
    pub cash_balance: f64,
    /// FX rates in `SimulationConfig::currencies` order
    pub fx_rates: Vec<f64>,
    pub buckets: Vec<BucketMonthRecord>,
}

impl MonthRecord {
    #[must_use]
    pub fn shortfall(&self) -> f64 {
        (self.expense - self.net_spent).max(0.0)
    }

    /// Total portfolio value (buckets plus cash reserve) in the home currency
    #[must_use]
    pub fn total_value_home(&self) -> f64 {
        self.buckets.iter().map(|b| b.value_home).sum::<f64>() + self.cash_balance
    }

    #[must_use]
    pub fn bucket(&self, id: BucketId) -> Option<&BucketMonthRecord> {
        self.buckets.get(id.index())
    }
}

/// Whether a path covered its expenses for the whole horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathVerdict {
    Success,
    Failure,
}

/// Complete output of one path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathResult {
    pub seed: u64,
    pub months: Vec<MonthRecord>,
    pub verdict: PathVerdict,
}

impl PathResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.verdict == PathVerdict::Success
    }

    /// Months where the expense was not fully covered
    pub fn shortfall_months(&self, tolerance: f64) -> impl Iterator<Item = &MonthRecord> {
        self.months
            .iter()
            .filter(move |m| m.expense - m.net_spent > tolerance)
    }

    #[must_use]
    pub fn final_value_home(&self) -> f64 {
        self.months
            .last()
            .map(MonthRecord::total_value_home)
            .unwrap_or(0.0)
    }

    #[must_use]
    pub fn total_expense(&self) -> f64 {
        self.months.iter().map(|m| m.expense).sum()
    }

    #[must_use]
    pub fn total_net_spent(&self) -> f64 {
        self.months.iter().map(|m| m.net_spent).sum()
    }

    #[must_use]
    pub fn total_fees_home(&self) -> f64 {
        self.months
            .iter()
            .flat_map(|m| m.buckets.iter())
            .map(|b| b.fees_home)
            .sum()
    }

    #[must_use]
    pub fn total_tax_home(&self) -> f64 {
        self.months
            .iter()
            .flat_map(|m| m.buckets.iter())
            .map(|b| b.tax_home)
            .sum()
    }
}
