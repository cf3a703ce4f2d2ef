//! Expense schedule: recurring periods and one-time expenses

use serde::{Deserialize, Serialize};

use super::volatility::VolatilityProfile;

/// A recurring monthly expense that lasts until the next period starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpensePeriod {
    /// 0-based month index from path start
    pub start_month: u32,
    pub amount_min: f64,
    pub amount_max: f64,
    pub amount_avg: f64,
    #[serde(default = "constant_profile")]
    pub volatility: VolatilityProfile,
}

fn constant_profile() -> VolatilityProfile {
    VolatilityProfile::Constant
}

impl ExpensePeriod {
    /// A period with no randomness
    #[must_use]
    pub fn fixed(start_month: u32, amount: f64) -> Self {
        Self {
            start_month,
            amount_min: amount,
            amount_max: amount,
            amount_avg: amount,
            volatility: VolatilityProfile::Constant,
        }
    }
}

/// An expense paid once, in today's money
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OneTimeExpense {
    /// 0-based month index from path start
    pub month: u32,
    pub amount: f64,
}

/// Resolves which period applies to a given month.
///
/// Periods are sorted by start month once; lookups walk back from the end.
#[derive(Debug, Clone)]
pub struct ExpenseSchedule<'a> {
    periods: Vec<&'a ExpensePeriod>,
    one_time: &'a [OneTimeExpense],
}

impl<'a> ExpenseSchedule<'a> {
    #[must_use]
    pub fn new(periods: &'a [ExpensePeriod], one_time: &'a [OneTimeExpense]) -> Self {
        let mut sorted: Vec<&ExpensePeriod> = periods.iter().collect();
        sorted.sort_by_key(|p| p.start_month);
        Self {
            periods: sorted,
            one_time,
        }
    }

    #[must_use]
    pub fn active_period(&self, month: u32) -> Option<&'a ExpensePeriod> {
        self.periods
            .iter()
            .rev()
            .find(|p| p.start_month <= month)
            .copied()
    }

    /// Sum of one-time expenses falling on `month`, before inflation
    #[must_use]
    pub fn one_time_total(&self, month: u32) -> f64 {
        self.one_time
            .iter()
            .filter(|e| e.month == month)
            .map(|e| e.amount)
            .sum()
    }
}
