//! Simulation configuration
//!
//! The main configuration type is `SimulationConfig`, which contains
//! everything needed to run a path or a Monte Carlo batch. It is consumed
//! read-only by the engine and must pass [`SimulationConfig::validate`]
//! before any path starts.
//!
//! # Builder DSL
//!
//! ```ignore
//! use bucketplan_core::config::{BucketBuilder, SimulationBuilder};
//!
//! let config = SimulationBuilder::new()
//!     .months(120)
//!     .home_currency("USD")
//!     .monthly_expense(3_000.0)
//!     .bucket(BucketBuilder::new("Cash", "USD").price(1.0).units(50_000.0).priority(0))
//!     .bucket(BucketBuilder::new("Stocks", "USD").price(100.0).units(4_000.0).priority(1))
//!     .build();
//! ```

use std::collections::{HashMap, HashSet};

use jiff::civil::Date;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::{
    BucketConfig, BucketId, ExpensePeriod, FxSettings, InflationSettings, MonteCarloConfig,
    OneTimeExpense, TriggerRule, VolatilityTable,
};

pub mod builder;

pub use builder::{BucketBuilder, SimulationBuilder};

fn default_duration_months() -> u32 {
    120
}

fn default_home_currency() -> String {
    "USD".to_string()
}

fn default_capital_gains_tax_pct() -> f64 {
    25.0
}

fn default_success_tolerance() -> f64 {
    0.01
}

/// Month 0 of a configuration without a start date
pub const DEFAULT_START_DATE: Date = jiff::civil::date(2000, 1, 1);

/// Complete simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Calendar date of month 0; only used to label records
    #[serde(default)]
    pub start_date: Option<Date>,
    #[serde(default = "default_duration_months")]
    pub duration_months: u32,
    /// Currency expenses are paid in
    #[serde(default = "default_home_currency")]
    pub home_currency: String,
    /// Flat rate applied to realized gains, percent
    #[serde(default = "default_capital_gains_tax_pct")]
    pub capital_gains_tax_pct: f64,
    /// Cash reserve in the home currency, spent before any bucket is sold
    #[serde(default)]
    pub hedge_amount: f64,
    /// Largest uncovered amount per month still counted as covered
    #[serde(default = "default_success_tolerance")]
    pub success_tolerance: f64,

    #[serde(default)]
    pub inflation: InflationSettings,
    #[serde(default)]
    pub expense_periods: Vec<ExpensePeriod>,
    #[serde(default)]
    pub one_time_expenses: Vec<OneTimeExpense>,

    #[serde(default)]
    pub buckets: Vec<BucketConfig>,
    /// FX settings for every non-home currency in use
    #[serde(default)]
    pub currencies: Vec<FxSettings>,
    #[serde(default)]
    pub volatility: VolatilityTable,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_date: None,
            duration_months: default_duration_months(),
            home_currency: default_home_currency(),
            capital_gains_tax_pct: default_capital_gains_tax_pct(),
            hedge_amount: 0.0,
            success_tolerance: default_success_tolerance(),
            inflation: InflationSettings::default(),
            expense_periods: Vec::new(),
            one_time_expenses: Vec::new(),
            buckets: Vec::new(),
            currencies: Vec::new(),
            volatility: VolatilityTable::default(),
        }
    }
}

impl SimulationConfig {
    /// Start date for labelling, falling back to `DEFAULT_START_DATE`
    #[must_use]
    pub fn start_date(&self) -> Date {
        self.start_date.unwrap_or(DEFAULT_START_DATE)
    }

    #[must_use]
    pub fn bucket(&self, id: BucketId) -> Option<&BucketConfig> {
        self.buckets.get(id.index())
    }

    /// Bucket ids in ascending spending priority, ties by declaration order
    #[must_use]
    pub fn spending_order(&self) -> Vec<BucketId> {
        let mut order: Vec<BucketId> = (0..self.buckets.len())
            .map(|i| BucketId(i as u16))
            .collect();
        order.sort_by_key(|id| self.buckets[id.index()].spending_priority);
        order
    }

    /// Maps each currency code to its index in `currencies`
    #[must_use]
    pub fn currency_index(&self) -> FxHashMap<&str, usize> {
        self.currencies
            .iter()
            .enumerate()
            .map(|(i, fx)| (fx.code.as_str(), i))
            .collect()
    }

    #[must_use]
    pub fn capital_gains_rate(&self) -> f64 {
        self.capital_gains_tax_pct / 100.0
    }

    /// Check every constraint the engine relies on.
    ///
    /// Nothing is simulated until this passes, so a bad configuration is
    /// never partially applied.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_months == 0 {
            return Err(ConfigError::EmptyHorizon);
        }
        if self.buckets.is_empty() {
            return Err(ConfigError::NoBuckets);
        }
        if self.buckets.len() > u16::MAX as usize {
            return Err(ConfigError::TooManyBuckets(self.buckets.len()));
        }

        check_pct("capital_gains_tax_pct", self.capital_gains_tax_pct)?;
        check_non_negative("hedge_amount", self.hedge_amount)?;
        check_non_negative("success_tolerance", self.success_tolerance)?;

        for (table, level, sigma) in self.volatility.entries() {
            check_non_negative(&format!("volatility.{table}.{level}"), sigma)?;
        }

        let inflation = &self.inflation;
        check_bounds(
            "inflation",
            inflation.min_pct,
            inflation.avg_pct,
            inflation.max_pct,
        )?;
        check_above_total_loss("inflation.min_pct", inflation.min_pct)?;

        for (i, period) in self.expense_periods.iter().enumerate() {
            let field = format!("expense_periods[{i}]");
            check_bounds(
                &field,
                period.amount_min,
                period.amount_avg,
                period.amount_max,
            )?;
            check_non_negative(&format!("{field}.amount_min"), period.amount_min)?;
            self.check_in_horizon(&format!("{field}.start_month"), period.start_month)?;
        }
        for (i, expense) in self.one_time_expenses.iter().enumerate() {
            let field = format!("one_time_expenses[{i}]");
            check_non_negative(&format!("{field}.amount"), expense.amount)?;
            self.check_in_horizon(&format!("{field}.month"), expense.month)?;
        }

        self.validate_currencies()?;
        self.validate_buckets()
    }

    fn check_in_horizon(&self, field: &str, month: u32) -> Result<(), ConfigError> {
        if month >= self.duration_months {
            return Err(ConfigError::ExpenseOutsideHorizon {
                field: field.to_string(),
                month,
                horizon: self.duration_months,
            });
        }
        Ok(())
    }

    fn validate_currencies(&self) -> Result<(), ConfigError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for fx in &self.currencies {
            if fx.code == self.home_currency {
                return Err(ConfigError::HomeCurrencyRate(fx.code.clone()));
            }
            if !seen.insert(fx.code.as_str()) {
                return Err(ConfigError::DuplicateCurrency(fx.code.clone()));
            }
            let field = format!("currencies.{}", fx.code);
            check_positive(&format!("{field}.min_rate"), fx.min_rate)?;
            check_positive(&format!("{field}.initial_rate"), fx.initial_rate)?;
            check_bounds(&field, fx.min_rate, fx.avg_rate, fx.max_rate)?;
            check_pct(&format!("{field}.conversion_fee_pct"), fx.conversion_fee_pct)?;
        }
        Ok(())
    }

    fn validate_buckets(&self) -> Result<(), ConfigError> {
        let currencies = self.currency_index();
        let mut priorities: HashMap<u32, &str> = HashMap::new();

        for (index, bucket) in self.buckets.iter().enumerate() {
            let field = format!("buckets.{}", bucket.name);

            if bucket.currency != self.home_currency
                && !currencies.contains_key(bucket.currency.as_str())
            {
                return Err(ConfigError::UnknownCurrency {
                    bucket: bucket.name.clone(),
                    currency: bucket.currency.clone(),
                });
            }

            check_positive(&format!("{field}.initial_price"), bucket.initial_price)?;
            check_non_negative(&format!("{field}.initial_units"), bucket.initial_units)?;
            check_bounds(
                &format!("{field}.growth"),
                bucket.growth.min_pct,
                bucket.growth.avg_pct,
                bucket.growth.max_pct,
            )?;
            check_above_total_loss(&format!("{field}.growth.min_pct"), bucket.growth.min_pct)?;
            check_above_total_loss(
                &format!("{field}.target_growth_pct"),
                bucket.target_growth_pct,
            )?;
            check_pct(&format!("{field}.buy_sell_fee_pct"), bucket.buy_sell_fee_pct)?;
            check_non_negative(&format!("{field}.cash_floor_months"), bucket.cash_floor_months)?;
            check_non_negative(
                &format!("{field}.required_runway_months"),
                bucket.required_runway_months,
            )?;

            if let Some(first) = priorities.insert(bucket.spending_priority, &bucket.name) {
                return Err(ConfigError::DuplicateSpendingPriority {
                    priority: bucket.spending_priority,
                    first: first.to_string(),
                    second: bucket.name.clone(),
                });
            }

            for (t, trigger) in bucket.triggers.iter().enumerate() {
                let target = trigger.rule.counterparty();
                if target.index() >= self.buckets.len() {
                    return Err(ConfigError::TriggerTargetMissing {
                        bucket: bucket.name.clone(),
                        trigger: t,
                        target,
                    });
                }
                if target.index() == index {
                    return Err(ConfigError::TriggerSelfReference {
                        bucket: bucket.name.clone(),
                        trigger: t,
                    });
                }

                let threshold_field = format!("{field}.triggers[{t}].{}", trigger.rule.name());
                match trigger.rule {
                    TriggerRule::TakeProfit { ratio, .. } => {
                        check_positive(&threshold_field, ratio)?;
                    }
                    TriggerRule::ShareExceeds { max_share_pct, .. } => {
                        check_pct(&threshold_field, max_share_pct)?;
                    }
                    TriggerRule::ShareBelow { min_share_pct, .. } => {
                        check_pct(&threshold_field, min_share_pct)?;
                    }
                    TriggerRule::Discount {
                        min_discount_pct, ..
                    } => {
                        check_finite(&threshold_field, min_discount_pct)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl MonteCarloConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for &p in &self.percentiles {
            if !(p > 0.0 && p < 1.0) {
                return Err(ConfigError::InvalidPercentile(p));
            }
        }
        Ok(())
    }
}

fn check_finite(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
            reason: "must be a finite number",
        })
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    check_finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
            reason: "must be >= 0",
        });
    }
    Ok(())
}

fn check_positive(field: &str, value: f64) -> Result<(), ConfigError> {
    check_finite(field, value)?;
    if value <= 0.0 {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
            reason: "must be > 0",
        });
    }
    Ok(())
}

/// Annual rates at or below -100% have no logarithm
fn check_above_total_loss(field: &str, value: f64) -> Result<(), ConfigError> {
    if value <= -100.0 {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
            reason: "must be above -100%",
        });
    }
    Ok(())
}

/// Percentages must lie in `[0, 100)`; a 100% fee or tax leaves nothing to sell into.
fn check_pct(field: &str, value: f64) -> Result<(), ConfigError> {
    check_finite(field, value)?;
    if !(0.0..100.0).contains(&value) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
            reason: "must lie in [0, 100)",
        });
    }
    Ok(())
}

fn check_bounds(field: &str, min: f64, avg: f64, max: f64) -> Result<(), ConfigError> {
    check_finite(field, min)?;
    check_finite(field, avg)?;
    check_finite(field, max)?;
    if min > max || avg < min || avg > max {
        return Err(ConfigError::InvalidBounds {
            field: field.to_string(),
            min,
            avg,
            max,
        });
    }
    Ok(())
}
