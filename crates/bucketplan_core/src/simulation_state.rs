use jiff::ToSpan;
use jiff::civil::Date;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::SimulationConfig;
use crate::error::{Result, SimulationError};
use crate::ledger::Holdings;
use crate::market::MarketGenerator;
use crate::model::{BucketConfig, BucketId, BucketMonthRecord, ExpenseSchedule, MonthRecord};
use crate::taxes::{SaleProceeds, foreign_to_home, home_to_foreign, trading_fee};

/// Trading activity of one bucket during the current month
#[derive(Debug, Clone, Copy, Default)]
pub struct BucketActivity {
    pub sold: f64,
    pub sold_home: f64,
    pub bought: f64,
    pub fees_home: f64,
    pub tax_home: f64,
    pub net_spent_home: f64,
}

/// Runtime state of one bucket
#[derive(Debug, Clone)]
pub struct BucketState<'a> {
    pub config: &'a BucketConfig,
    pub holdings: Holdings,
    pub price: f64,
    /// Index into `PathState::fx_rates`, or `None` for the home currency
    pub fx_index: Option<usize>,
    pub activity: BucketActivity,
}

impl BucketState<'_> {
    #[must_use]
    pub fn value(&self) -> f64 {
        self.holdings.units() * self.price
    }

    #[must_use]
    pub fn fee_rate(&self) -> f64 {
        self.config.buy_sell_fee_pct / 100.0
    }
}

/// Bucket values frozen after the month's price move.
///
/// Share-based triggers read from this, so their thresholds do not shift as
/// earlier triggers in the same month move money around.
#[derive(Debug, Clone, Default)]
pub struct PortfolioSnapshot {
    pub values_home: Vec<f64>,
    /// Sum over buckets; the cash reserve is not part of any share
    pub total_home: f64,
}

impl PortfolioSnapshot {
    /// Share of `id` in percent
    #[must_use]
    pub fn share_pct(&self, id: BucketId) -> f64 {
        if self.total_home <= 0.0 {
            return 0.0;
        }
        100.0 * self.values_home[id.index()] / self.total_home
    }
}

/// Everything one path mutates as it steps month by month
#[derive(Debug, Clone)]
pub struct PathState<'a> {
    pub config: &'a SimulationConfig,
    pub market: MarketGenerator,
    pub schedule: ExpenseSchedule<'a>,
    /// Bucket visiting order for triggers and expense coverage
    pub spending_order: Vec<BucketId>,
    pub start_date: Date,

    pub buckets: Vec<BucketState<'a>>,
    pub fx_rates: Vec<f64>,
    fx_fee_rates: Vec<f64>,
    tax_rate: f64,

    /// Monthly inflation rate as a fraction
    pub inflation_rate: f64,
    pub cumulative_inflation: f64,
    /// Home-currency cash reserve
    pub cash: f64,
    pub cash_spent: f64,

    /// Index of the month being simulated
    pub month: u32,
    /// This month's inflated expense
    pub expense: f64,
    pub rng: SmallRng,
}

impl<'a> PathState<'a> {
    /// Build the month-0 state. `config` must already be validated.
    #[must_use]
    pub fn new(config: &'a SimulationConfig, seed: u64) -> Self {
        let currencies = config.currency_index();
        let market = MarketGenerator::new(config);

        let buckets = config
            .buckets
            .iter()
            .map(|bucket| BucketState {
                config: bucket,
                holdings: Holdings::with_opening_lot(
                    bucket.cost_basis,
                    bucket.initial_units,
                    bucket.initial_price,
                ),
                price: bucket.initial_price,
                fx_index: currencies.get(bucket.currency.as_str()).copied(),
                activity: BucketActivity::default(),
            })
            .collect();

        Self {
            config,
            inflation_rate: market.initial_inflation_rate(),
            market,
            schedule: ExpenseSchedule::new(&config.expense_periods, &config.one_time_expenses),
            spending_order: config.spending_order(),
            start_date: config.start_date(),
            buckets,
            fx_rates: config.currencies.iter().map(|fx| fx.initial_rate).collect(),
            fx_fee_rates: config
                .currencies
                .iter()
                .map(|fx| fx.conversion_fee_pct / 100.0)
                .collect(),
            tax_rate: config.capital_gains_rate(),
            cumulative_inflation: 1.0,
            cash: config.hedge_amount,
            cash_spent: 0.0,
            month: 0,
            expense: 0.0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub fn bucket(&self, id: BucketId) -> &BucketState<'a> {
        &self.buckets[id.index()]
    }

    /// Home-currency units per unit of the bucket's currency
    #[must_use]
    pub fn fx_rate(&self, id: BucketId) -> f64 {
        self.bucket(id)
            .fx_index
            .map_or(1.0, |i| self.fx_rates[i])
    }

    fn fx_fee_rate(&self, id: BucketId) -> f64 {
        self.bucket(id)
            .fx_index
            .map_or(0.0, |i| self.fx_fee_rates[i])
    }

    #[must_use]
    pub fn price_home(&self, id: BucketId) -> f64 {
        self.bucket(id).price * self.fx_rate(id)
    }

    #[must_use]
    pub fn value_home(&self, id: BucketId) -> f64 {
        self.bucket(id).value() * self.fx_rate(id)
    }

    /// Buckets plus the cash reserve, in the home currency
    #[must_use]
    pub fn total_value_home(&self) -> f64 {
        let buckets: f64 = (0..self.buckets.len())
            .map(|i| self.value_home(BucketId(i as u16)))
            .sum();
        buckets + self.cash
    }

    #[must_use]
    pub fn snapshot(&self) -> PortfolioSnapshot {
        let values_home: Vec<f64> = (0..self.buckets.len())
            .map(|i| self.value_home(BucketId(i as u16)))
            .collect();
        let total_home = values_home.iter().sum();
        PortfolioSnapshot {
            values_home,
            total_home,
        }
    }

    /// Months of the current expense a bucket could pay for on its own
    #[must_use]
    pub fn runway_months(&self, id: BucketId) -> f64 {
        if self.expense <= 0.0 {
            return f64::INFINITY;
        }
        self.value_home(id) / self.expense
    }

    /// Home-currency money selling `units` would raise, without selling
    #[must_use]
    pub fn preview_sale_home(&self, id: BucketId, units: f64) -> f64 {
        let bucket = self.bucket(id);
        let units = units.min(bucket.holdings.units());
        if units <= 0.0 {
            return 0.0;
        }
        let sale = SaleProceeds::compute(
            units * bucket.price,
            bucket.holdings.preview_cost(units),
            bucket.fee_rate(),
            self.tax_rate,
        );
        foreign_to_home(sale.net(), self.fx_rate(id), self.fx_fee_rate(id)).amount
    }

    /// Sell `units` of a bucket, returning the home-currency money raised
    /// after the sell fee, tax and conversion fee.
    pub fn sell(&mut self, id: BucketId, units: f64) -> Result<f64> {
        let month = self.month;
        let rate = self.fx_rate(id);
        let fx_fee_rate = self.fx_fee_rate(id);
        let tax_rate = self.tax_rate;

        let bucket = &mut self.buckets[id.index()];
        let disposal = bucket
            .holdings
            .sell(units, bucket.price)
            .map_err(|source| SimulationError::Ledger {
                bucket: id,
                month,
                source,
            })?;

        let sale = SaleProceeds::compute(
            disposal.proceeds,
            disposal.cost_basis,
            bucket.fee_rate(),
            tax_rate,
        );
        let conversion = foreign_to_home(sale.net(), rate, fx_fee_rate);

        let activity = &mut bucket.activity;
        activity.sold += sale.gross;
        activity.sold_home += sale.gross * rate;
        activity.fees_home += sale.fee * rate + conversion.fee_home;
        activity.tax_home += sale.tax * rate;

        Ok(conversion.amount)
    }

    /// Invest a home-currency amount into a bucket, returning the units bought
    pub fn buy(&mut self, id: BucketId, amount_home: f64) -> f64 {
        if amount_home <= 0.0 {
            return 0.0;
        }
        let month = self.month;
        let rate = self.fx_rate(id);
        let conversion = home_to_foreign(amount_home, rate, self.fx_fee_rate(id));

        let bucket = &mut self.buckets[id.index()];
        let fee = trading_fee(conversion.amount, bucket.fee_rate());
        let invested = conversion.amount - fee;
        let price = bucket.price;
        let units = bucket.holdings.buy(invested, price, month);

        let activity = &mut bucket.activity;
        activity.bought += invested;
        activity.fees_home += conversion.fee_home + fee * rate;
        units
    }

    /// Clear the per-month counters
    pub fn begin_month(&mut self) {
        for bucket in &mut self.buckets {
            bucket.activity = BucketActivity::default();
        }
        self.cash_spent = 0.0;
        self.expense = 0.0;
    }

    /// Draw this month's prices, FX rates, inflation and expense, in that order
    pub fn advance_market(&mut self) {
        let mut prices: Vec<f64> = self.buckets.iter().map(|b| b.price).collect();
        self.market.advance_prices(&mut prices, &mut self.rng);
        for (bucket, price) in self.buckets.iter_mut().zip(prices) {
            bucket.price = price;
        }

        self.market.advance_fx(&mut self.fx_rates, &mut self.rng);

        self.inflation_rate = self
            .market
            .advance_inflation(self.inflation_rate, &mut self.rng);
        self.cumulative_inflation *= 1.0 + self.inflation_rate;

        let base = self
            .schedule
            .active_period(self.month)
            .map_or(0.0, |period| self.market.draw_expense(period, &mut self.rng));
        let one_time = self.schedule.one_time_total(self.month);
        self.expense = (base + one_time) * self.cumulative_inflation;
    }

    /// Calendar date of the current month
    #[must_use]
    pub fn current_date(&self) -> Date {
        self.start_date
            .saturating_add(i64::from(self.month).months())
    }

    /// Emit the record for the current month
    #[must_use]
    pub fn record(&self, net_spent: f64) -> MonthRecord {
        let buckets = self
            .buckets
            .iter()
            .enumerate()
            .map(|(i, bucket)| {
                let rate = self.fx_rate(BucketId(i as u16));
                let value = bucket.value();
                BucketMonthRecord {
                    price: bucket.price,
                    price_home: bucket.price * rate,
                    units: bucket.holdings.units(),
                    value,
                    value_home: value * rate,
                    sold: bucket.activity.sold,
                    sold_home: bucket.activity.sold_home,
                    bought: bucket.activity.bought,
                    fees_home: bucket.activity.fees_home,
                    tax_home: bucket.activity.tax_home,
                    net_spent_home: bucket.activity.net_spent_home,
                }
            })
            .collect();

        MonthRecord {
            month: self.month,
            date: self.current_date(),
            inflation_rate: self.inflation_rate,
            cumulative_inflation: self.cumulative_inflation,
            expense: self.expense,
            net_spent,
            cash_spent: self.cash_spent,
            cash_balance: self.cash,
            fx_rates: self.fx_rates.clone(),
            buckets,
        }
    }
}
