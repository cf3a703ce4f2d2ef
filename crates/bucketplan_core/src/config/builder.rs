//! Simulation Builder
//!
//! A fluent API for creating simulations. Buckets are referenced by name in
//! trigger definitions and resolved to `BucketId`s when `build()` runs.
//!
//! # Example
//!
//! ```ignore
//! use bucketplan_core::config::{BucketBuilder, SimulationBuilder};
//! use bucketplan_core::model::CostBasisMethod;
//!
//! let config = SimulationBuilder::new()
//!     .start(2025, 1, 1)
//!     .years(30)
//!     .home_currency("USD")
//!     .capital_gains_tax_pct(15.0)
//!     .monthly_expense(4_000.0)
//!     .bucket(
//!         BucketBuilder::new("Cash", "USD")
//!             .price(1.0)
//!             .units(60_000.0)
//!             .priority(0)
//!             .cash_floor_months(0.0),
//!     )
//!     .bucket(
//!         BucketBuilder::new("World Equity", "USD")
//!             .price(100.0)
//!             .units(8_000.0)
//!             .growth(-30.0, 30.0, 7.0)
//!             .equity()
//!             .target_growth(7.0)
//!             .cost_basis(CostBasisMethod::Fifo)
//!             .priority(1)
//!             .take_profit(1.5, "Cash")
//!             .share_below(40.0, "Cash"),
//!     )
//!     .build();
//! ```

use std::collections::HashMap;

use jiff::civil::Date;

use super::SimulationConfig;
use crate::model::{
    BucketConfig, BucketId, CostBasisMethod, ExpensePeriod, FxSettings, GrowthBounds,
    InflationSettings, OneTimeExpense, Trigger, TriggerFrequency, TriggerRule, VolatilityProfile,
    VolatilityTable,
};

/// Builder for creating simulations with name-based trigger targets
#[derive(Debug, Clone, Default)]
pub struct SimulationBuilder {
    config: SimulationConfig,
    pending_buckets: Vec<BucketBuilder>,
}

impl SimulationBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Basic Configuration
    // =========================================================================

    #[must_use]
    pub fn start_date(mut self, date: Date) -> Self {
        self.config.start_date = Some(date);
        self
    }

    /// Set the start date from year, month, day
    #[must_use]
    pub fn start(self, year: i16, month: i8, day: i8) -> Self {
        self.start_date(jiff::civil::date(year, month, day))
    }

    #[must_use]
    pub fn months(mut self, months: u32) -> Self {
        self.config.duration_months = months;
        self
    }

    #[must_use]
    pub fn years(self, years: u32) -> Self {
        self.months(years * 12)
    }

    #[must_use]
    pub fn home_currency(mut self, code: impl Into<String>) -> Self {
        self.config.home_currency = code.into();
        self
    }

    #[must_use]
    pub fn capital_gains_tax_pct(mut self, pct: f64) -> Self {
        self.config.capital_gains_tax_pct = pct;
        self
    }

    #[must_use]
    pub fn hedge_amount(mut self, amount: f64) -> Self {
        self.config.hedge_amount = amount;
        self
    }

    #[must_use]
    pub fn success_tolerance(mut self, tolerance: f64) -> Self {
        self.config.success_tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn volatility_table(mut self, table: VolatilityTable) -> Self {
        self.config.volatility = table;
        self
    }

    // =========================================================================
    // Inflation & Currencies
    // =========================================================================

    #[must_use]
    pub fn inflation(mut self, settings: InflationSettings) -> Self {
        self.config.inflation = settings;
        self
    }

    #[must_use]
    pub fn no_inflation(self) -> Self {
        self.inflation(InflationSettings::none())
    }

    #[must_use]
    pub fn currency(mut self, settings: FxSettings) -> Self {
        self.config.currencies.push(settings);
        self
    }

    // =========================================================================
    // Expenses
    // =========================================================================

    /// Constant expense from month 0 to the end of the horizon
    #[must_use]
    pub fn monthly_expense(self, amount: f64) -> Self {
        self.expense_period(ExpensePeriod::fixed(0, amount))
    }

    #[must_use]
    pub fn expense_period(mut self, period: ExpensePeriod) -> Self {
        self.config.expense_periods.push(period);
        self
    }

    #[must_use]
    pub fn one_time_expense(mut self, month: u32, amount: f64) -> Self {
        self.config
            .one_time_expenses
            .push(OneTimeExpense { month, amount });
        self
    }

    // =========================================================================
    // Buckets
    // =========================================================================

    #[must_use]
    pub fn bucket(mut self, bucket: BucketBuilder) -> Self {
        self.pending_buckets.push(bucket);
        self
    }

    /// Resolve bucket names and produce the configuration.
    ///
    /// Unknown trigger targets resolve to an out-of-range id so that
    /// `SimulationConfig::validate` reports them.
    #[must_use]
    pub fn build(mut self) -> SimulationConfig {
        let ids: HashMap<String, BucketId> = self
            .pending_buckets
            .iter()
            .enumerate()
            .map(|(i, b)| (b.config.name.clone(), BucketId(i as u16)))
            .collect();
        let resolve = |name: &str| ids.get(name).copied().unwrap_or(BucketId(u16::MAX));

        self.config.buckets = self
            .pending_buckets
            .into_iter()
            .map(|b| {
                let mut config = b.config;
                config.triggers = b
                    .triggers
                    .into_iter()
                    .map(|pending| Trigger {
                        rule: pending.resolve(&resolve),
                        frequency: pending.frequency,
                    })
                    .collect();
                config
            })
            .collect();

        self.config
    }
}

#[derive(Debug, Clone)]
enum PendingKind {
    TakeProfit,
    ShareExceeds,
    Discount,
    ShareBelow,
}

#[derive(Debug, Clone)]
struct PendingTrigger {
    kind: PendingKind,
    threshold: f64,
    counterparty: String,
    frequency: TriggerFrequency,
}

impl PendingTrigger {
    fn resolve(&self, resolve: &impl Fn(&str) -> BucketId) -> TriggerRule {
        let other = resolve(&self.counterparty);
        match self.kind {
            PendingKind::TakeProfit => TriggerRule::TakeProfit {
                ratio: self.threshold,
                standby: other,
            },
            PendingKind::ShareExceeds => TriggerRule::ShareExceeds {
                max_share_pct: self.threshold,
                standby: other,
            },
            PendingKind::Discount => TriggerRule::Discount {
                min_discount_pct: self.threshold,
                source: other,
            },
            PendingKind::ShareBelow => TriggerRule::ShareBelow {
                min_share_pct: self.threshold,
                source: other,
            },
        }
    }
}

/// Builder for a single bucket
#[derive(Debug, Clone)]
pub struct BucketBuilder {
    config: BucketConfig,
    triggers: Vec<PendingTrigger>,
    frequency: TriggerFrequency,
}

impl BucketBuilder {
    /// A bucket with unit price 1, no holdings, no growth and no volatility
    #[must_use]
    pub fn new(name: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            config: BucketConfig {
                name: name.into(),
                currency: currency.into(),
                initial_price: 1.0,
                initial_units: 0.0,
                growth: GrowthBounds::default(),
                volatility: VolatilityProfile::Constant,
                buy_sell_fee_pct: 0.0,
                cost_basis: CostBasisMethod::Fifo,
                target_growth_pct: 0.0,
                cash_floor_months: 0.0,
                required_runway_months: 0.0,
                spending_priority: 0,
                triggers: Vec::new(),
            },
            triggers: Vec::new(),
            frequency: TriggerFrequency::Monthly,
        }
    }

    #[must_use]
    pub fn price(mut self, price: f64) -> Self {
        self.config.initial_price = price;
        self
    }

    #[must_use]
    pub fn units(mut self, units: f64) -> Self {
        self.config.initial_units = units;
        self
    }

    /// Set units so the bucket starts with `value` in its own currency
    #[must_use]
    pub fn value(mut self, value: f64) -> Self {
        self.config.initial_units = value / self.config.initial_price;
        self
    }

    #[must_use]
    pub fn growth(mut self, min_pct: f64, max_pct: f64, avg_pct: f64) -> Self {
        self.config.growth = GrowthBounds {
            min_pct,
            max_pct,
            avg_pct,
        };
        self
    }

    #[must_use]
    pub fn volatility(mut self, profile: VolatilityProfile) -> Self {
        self.config.volatility = profile;
        self
    }

    /// Moderate volatility, the equity-index level
    #[must_use]
    pub fn equity(self) -> Self {
        self.volatility(VolatilityProfile::Moderate)
    }

    #[must_use]
    pub fn fee_pct(mut self, pct: f64) -> Self {
        self.config.buy_sell_fee_pct = pct;
        self
    }

    #[must_use]
    pub fn cost_basis(mut self, method: CostBasisMethod) -> Self {
        self.config.cost_basis = method;
        self
    }

    #[must_use]
    pub fn target_growth(mut self, pct: f64) -> Self {
        self.config.target_growth_pct = pct;
        self
    }

    #[must_use]
    pub fn cash_floor_months(mut self, months: f64) -> Self {
        self.config.cash_floor_months = months;
        self
    }

    #[must_use]
    pub fn runway_months(mut self, months: f64) -> Self {
        self.config.required_runway_months = months;
        self
    }

    #[must_use]
    pub fn priority(mut self, rank: u32) -> Self {
        self.config.spending_priority = rank;
        self
    }

    // =========================================================================
    // Triggers
    // =========================================================================

    /// Triggers added after this call are evaluated yearly
    #[must_use]
    pub fn yearly(mut self) -> Self {
        self.frequency = TriggerFrequency::Yearly;
        self
    }

    /// Triggers added after this call are evaluated monthly
    #[must_use]
    pub fn monthly(mut self) -> Self {
        self.frequency = TriggerFrequency::Monthly;
        self
    }

    fn push_trigger(mut self, kind: PendingKind, threshold: f64, other: &str) -> Self {
        self.triggers.push(PendingTrigger {
            kind,
            threshold,
            counterparty: other.to_string(),
            frequency: self.frequency,
        });
        self
    }

    #[must_use]
    pub fn take_profit(self, ratio: f64, standby: &str) -> Self {
        self.push_trigger(PendingKind::TakeProfit, ratio, standby)
    }

    #[must_use]
    pub fn share_exceeds(self, max_share_pct: f64, standby: &str) -> Self {
        self.push_trigger(PendingKind::ShareExceeds, max_share_pct, standby)
    }

    #[must_use]
    pub fn discount(self, min_discount_pct: f64, source: &str) -> Self {
        self.push_trigger(PendingKind::Discount, min_discount_pct, source)
    }

    #[must_use]
    pub fn share_below(self, min_share_pct: f64, source: &str) -> Self {
        self.push_trigger(PendingKind::ShareBelow, min_share_pct, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    #[test]
    fn test_builder_resolves_trigger_names() {
        let config = SimulationBuilder::new()
            .months(12)
            .monthly_expense(1_000.0)
            .bucket(BucketBuilder::new("Cash", "USD").units(10_000.0).priority(0))
            .bucket(
                BucketBuilder::new("Stocks", "USD")
                    .price(50.0)
                    .units(100.0)
                    .priority(1)
                    .take_profit(1.5, "Cash")
                    .yearly()
                    .share_below(20.0, "Cash"),
            )
            .build();

        assert!(config.validate().is_ok());
        let stocks = &config.buckets[1];
        assert_eq!(
            stocks.triggers[0],
            Trigger::monthly(TriggerRule::TakeProfit {
                ratio: 1.5,
                standby: BucketId(0)
            })
        );
        assert_eq!(stocks.triggers[1].frequency, TriggerFrequency::Yearly);
    }

    #[test]
    fn test_unknown_trigger_target_fails_validation() {
        let config = SimulationBuilder::new()
            .bucket(BucketBuilder::new("Stocks", "USD").take_profit(1.5, "Nowhere"))
            .build();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::TriggerTargetMissing { .. })
        ));
    }

    #[test]
    fn test_value_sets_units_from_price() {
        let config = SimulationBuilder::new()
            .bucket(BucketBuilder::new("Stocks", "USD").price(40.0).value(2_000.0))
            .build();
        assert_eq!(config.buckets[0].initial_units, 50.0);
    }
}
