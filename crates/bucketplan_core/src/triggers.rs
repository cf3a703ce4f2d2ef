//! Rule-driven rebalancing between buckets
//!
//! Each month runs a sell pass over every sell rule, then a buy pass over
//! every buy rule. Buckets are visited in spending order and a bucket's rules
//! in declaration order. A rule that fires turns into a single transfer: units
//! sold from one bucket, with the proceeds (after fee, tax and conversion)
//! invested in another.

use tracing::debug;

use crate::error::Result;
use crate::model::{BucketId, TriggerRule, TriggerSide};
use crate::simulation_state::{PathState, PortfolioSnapshot};

/// Transfers worth less than this (home currency) are skipped
const MIN_TRANSFER_HOME: f64 = 1e-6;

/// Slack on threshold comparisons, so rounding in the target price cannot
/// flip a rule sitting exactly on its threshold
const THRESHOLD_EPSILON: f64 = 1e-9;

/// A fired rule, resolved into units to move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transfer {
    pub from: BucketId,
    pub to: BucketId,
    pub units: f64,
}

/// Run both trigger passes for the current month
pub fn run_triggers(state: &mut PathState<'_>) -> Result<()> {
    let snapshot = state.snapshot();
    run_pass(state, &snapshot, TriggerSide::Sell)?;
    run_pass(state, &snapshot, TriggerSide::Buy)
}

fn run_pass(
    state: &mut PathState<'_>,
    snapshot: &PortfolioSnapshot,
    side: TriggerSide,
) -> Result<()> {
    for k in 0..state.spending_order.len() {
        let id = state.spending_order[k];
        let bucket = state.bucket(id).config;

        for trigger in &bucket.triggers {
            if trigger.rule.side() != side || !trigger.frequency.is_due(state.month) {
                continue;
            }
            let Some(transfer) = evaluate(state, snapshot, id, &trigger.rule) else {
                continue;
            };
            if !runway_allows(state, transfer.from) {
                debug!(
                    month = state.month,
                    rule = trigger.rule.name(),
                    bucket = %bucket.name,
                    "trigger suppressed by runway guard"
                );
                continue;
            }
            execute(state, &trigger.rule, transfer)?;
        }
    }
    Ok(())
}

/// Decide whether `rule` on bucket `id` fires this month and how much it moves
#[must_use]
pub fn evaluate(
    state: &PathState<'_>,
    snapshot: &PortfolioSnapshot,
    id: BucketId,
    rule: &TriggerRule,
) -> Option<Transfer> {
    let bucket = state.bucket(id);
    let config = bucket.config;
    let units = bucket.holdings.units();
    let price = bucket.price;
    // the price move for month t lands at the end of month t
    let target_price = config.target_price(state.month + 1);

    let transfer = match *rule {
        TriggerRule::TakeProfit { ratio, standby } => {
            let target_growth = 100.0 * (target_price / config.initial_price - 1.0);
            if target_growth <= 0.0 {
                return None;
            }
            let actual_growth = 100.0 * (price / config.initial_price - 1.0);
            let below_ratio = actual_growth / target_growth < ratio - THRESHOLD_EPSILON;
            if below_ratio || price <= target_price {
                return None;
            }
            let excess_value = units * (price - target_price);
            Transfer {
                from: id,
                to: standby,
                units: excess_value / price,
            }
        }
        TriggerRule::ShareExceeds {
            max_share_pct,
            standby,
        } => {
            if snapshot.share_pct(id) <= max_share_pct + THRESHOLD_EPSILON {
                return None;
            }
            let excess_home =
                snapshot.values_home[id.index()] - max_share_pct / 100.0 * snapshot.total_home;
            Transfer {
                from: id,
                to: standby,
                units: excess_home / state.price_home(id),
            }
        }
        TriggerRule::Discount {
            min_discount_pct,
            source,
        } => {
            let discount_pct = 100.0 * target_price / price - 100.0;
            if discount_pct <= min_discount_pct + THRESHOLD_EPSILON {
                return None;
            }
            let wanted_home = units * (target_price - price) * state.fx_rate(id);
            Transfer {
                from: source,
                to: id,
                units: wanted_home / state.price_home(source),
            }
        }
        TriggerRule::ShareBelow {
            min_share_pct,
            source,
        } => {
            if snapshot.share_pct(id) >= min_share_pct - THRESHOLD_EPSILON {
                return None;
            }
            let deficit_home =
                min_share_pct / 100.0 * snapshot.total_home - snapshot.values_home[id.index()];
            Transfer {
                from: source,
                to: id,
                units: deficit_home / state.price_home(source),
            }
        }
    };

    let held = state.bucket(transfer.from).holdings.units();
    let units = transfer.units.min(held);
    if units * state.price_home(transfer.from) <= MIN_TRANSFER_HOME {
        return None;
    }
    Some(Transfer { units, ..transfer })
}

/// A bucket may only be sold by a trigger while it covers its required runway
#[must_use]
pub fn runway_allows(state: &PathState<'_>, seller: BucketId) -> bool {
    state.runway_months(seller) >= state.bucket(seller).config.required_runway_months
}

fn execute(state: &mut PathState<'_>, rule: &TriggerRule, transfer: Transfer) -> Result<()> {
    let raised_home = state.sell(transfer.from, transfer.units)?;
    let bought_units = state.buy(transfer.to, raised_home);

    debug!(
        month = state.month,
        rule = rule.name(),
        threshold = rule.threshold(),
        from = %transfer.from,
        to = %transfer.to,
        sold_units = transfer.units,
        raised_home,
        bought_units,
        "trigger executed"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BucketBuilder, SimulationBuilder, SimulationConfig};

    const CASH: BucketId = BucketId(0);
    const STOCKS: BucketId = BucketId(1);

    /// 10k in a USD cash bucket plus 100 units of a stock bucket priced at 100
    fn cash_and(stocks: BucketBuilder) -> SimulationConfig {
        SimulationBuilder::new()
            .no_inflation()
            .capital_gains_tax_pct(0.0)
            .monthly_expense(1_000.0)
            .bucket(BucketBuilder::new("Cash", "USD").units(10_000.0).priority(0))
            .bucket(stocks.price(100.0).units(100.0).priority(1))
            .build()
    }

    fn stocks() -> BucketBuilder {
        BucketBuilder::new("Stocks", "USD").target_growth(10.0)
    }

    #[test]
    fn test_discount_fires_only_past_threshold() {
        let config = cash_and(stocks().discount(10.0, "Cash"));
        let mut state = PathState::new(&config, 0);
        // one year in, the target price is exactly 110
        state.month = 11;
        let rule = config.buckets[1].triggers[0].rule;

        state.buckets[1].price = 100.0;
        let snapshot = state.snapshot();
        assert_eq!(evaluate(&state, &snapshot, STOCKS, &rule), None);

        state.buckets[1].price = 90.0;
        let snapshot = state.snapshot();
        let transfer = evaluate(&state, &snapshot, STOCKS, &rule).unwrap();
        assert_eq!(transfer.from, CASH);
        assert_eq!(transfer.to, STOCKS);
        // 100 units x (110 - 90)
        assert!((transfer.units - 2_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_discount_buy_is_funded_by_source() {
        let config = cash_and(stocks().discount(10.0, "Cash"));
        let mut state = PathState::new(&config, 0);
        state.month = 11;
        state.buckets[1].price = 90.0;

        run_triggers(&mut state).unwrap();

        assert!((state.bucket(CASH).holdings.units() - 8_000.0).abs() < 1e-9);
        let expected = 100.0 + 2_000.0 / 90.0;
        assert!((state.bucket(STOCKS).holdings.units() - expected).abs() < 1e-9);
        assert!((state.bucket(STOCKS).activity.bought - 2_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_take_profit_sells_excess_over_target() {
        let config = cash_and(stocks().take_profit(1.5, "Cash"));
        let mut state = PathState::new(&config, 0);
        state.month = 11;

        // 12% actual vs 10% target is below the 1.5 ratio
        state.buckets[1].price = 112.0;
        run_triggers(&mut state).unwrap();
        assert_eq!(state.bucket(STOCKS).activity.sold, 0.0);

        state.buckets[1].price = 120.0;
        run_triggers(&mut state).unwrap();
        let sold = state.bucket(STOCKS).activity.sold;
        assert!((sold - 1_000.0).abs() < 1e-9, "sold {sold}");
        assert!((state.bucket(CASH).holdings.units() - 11_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_take_profit_fires_at_exact_ratio() {
        let config = cash_and(stocks().take_profit(2.0, "Cash"));
        let mut state = PathState::new(&config, 0);
        state.month = 11;

        // 20% actual against a 10% target is exactly the 2.0 ratio
        state.buckets[1].price = 120.0;
        let snapshot = state.snapshot();
        let rule = config.buckets[1].triggers[0].rule;
        let transfer = evaluate(&state, &snapshot, STOCKS, &rule).unwrap();
        assert_eq!(transfer.to, CASH);
        // 100 units x (120 - 110) / 120
        assert!((transfer.units - 1_000.0 / 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_share_rules_hold_at_exact_threshold() {
        // both buckets start at a 50% share
        for bucket in [
            stocks().share_exceeds(50.0, "Cash"),
            stocks().share_below(50.0, "Cash"),
        ] {
            let config = cash_and(bucket);
            let state = PathState::new(&config, 0);
            let snapshot = state.snapshot();
            let rule = config.buckets[1].triggers[0].rule;
            assert_eq!(evaluate(&state, &snapshot, STOCKS, &rule), None);
        }
    }

    #[test]
    fn test_take_profit_needs_positive_target_growth() {
        let config = cash_and(
            BucketBuilder::new("Stocks", "USD")
                .target_growth(0.0)
                .take_profit(1.5, "Cash"),
        );
        let mut state = PathState::new(&config, 0);
        state.month = 11;
        state.buckets[1].price = 500.0;

        run_triggers(&mut state).unwrap();
        assert_eq!(state.bucket(STOCKS).activity.sold, 0.0);
    }

    #[test]
    fn test_share_rules_use_month_snapshot() {
        // both buckets start at 10k, a 50% share each
        let config = cash_and(stocks().share_exceeds(40.0, "Cash"));
        let mut state = PathState::new(&config, 0);
        run_triggers(&mut state).unwrap();
        // sells 10k - 0.4 x 20k
        assert!((state.bucket(STOCKS).activity.sold - 2_000.0).abs() < 1e-9);

        let config = cash_and(stocks().share_below(60.0, "Cash"));
        let mut state = PathState::new(&config, 0);
        run_triggers(&mut state).unwrap();
        // buys 0.6 x 20k - 10k
        assert!((state.bucket(STOCKS).activity.bought - 2_000.0).abs() < 1e-9);
        assert!((state.bucket(CASH).holdings.units() - 8_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_runway_guard_blocks_funding_source() {
        let config = SimulationBuilder::new()
            .no_inflation()
            .bucket(
                BucketBuilder::new("Cash", "USD")
                    .units(10_000.0)
                    .runway_months(12.0)
                    .priority(0),
            )
            .bucket(
                stocks()
                    .price(100.0)
                    .units(100.0)
                    .priority(1)
                    .discount(10.0, "Cash"),
            )
            .build();
        let mut state = PathState::new(&config, 0);
        state.month = 11;
        state.buckets[1].price = 90.0;

        // 10 months of runway against a 12 month requirement
        state.expense = 1_000.0;
        run_triggers(&mut state).unwrap();
        assert_eq!(state.bucket(CASH).activity.sold, 0.0);

        // no expense means unlimited runway
        state.expense = 0.0;
        assert!(runway_allows(&state, CASH));
        run_triggers(&mut state).unwrap();
        assert!(state.bucket(CASH).activity.sold > 0.0);
    }

    #[test]
    fn test_yearly_rules_wait_for_year_boundary() {
        let config = cash_and(stocks().yearly().share_exceeds(40.0, "Cash"));
        let mut state = PathState::new(&config, 0);

        state.month = 5;
        run_triggers(&mut state).unwrap();
        assert_eq!(state.bucket(STOCKS).activity.sold, 0.0);

        state.month = 12;
        run_triggers(&mut state).unwrap();
        assert!(state.bucket(STOCKS).activity.sold > 0.0);
    }

    #[test]
    fn test_sale_is_bounded_by_holdings() {
        let config = cash_and(stocks().share_below(99.0, "Cash"));
        let mut state = PathState::new(&config, 0);
        let snapshot = state.snapshot();
        let rule = config.buckets[1].triggers[0].rule;

        // 0.99 x 20k - 10k
        let transfer = evaluate(&state, &snapshot, STOCKS, &rule).unwrap();
        assert!((transfer.units - 9_800.0).abs() < 1e-9);

        // the source now holds less than the rule wants
        state.buckets[0].holdings.sell(5_000.0, 1.0).unwrap();
        let transfer = evaluate(&state, &snapshot, STOCKS, &rule).unwrap();
        assert!((transfer.units - 5_000.0).abs() < 1e-9);
    }
}
