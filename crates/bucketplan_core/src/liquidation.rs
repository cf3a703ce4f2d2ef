//! Expense coverage
//!
//! The month's expense is paid from the cash reserve first, then by selling
//! buckets in spending order. Each bucket keeps `cash_floor_months` of the
//! month's expense untouched. Because fees, tax and conversion eat into the
//! proceeds, the units to sell are grossed up until the net amount covers the
//! remaining gap.

use tracing::trace;

use crate::error::Result;
use crate::model::BucketId;
use crate::simulation_state::PathState;

/// Gaps smaller than this (home currency) count as covered
pub const COVERAGE_EPSILON: f64 = 1e-6;

/// Gross-up iterations allowed per bucket
const MAX_GROSS_UP_ROUNDS: usize = 8;

/// How the month's expense was paid
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Coverage {
    /// Total applied to the expense, never above it
    pub net_spent: f64,
    /// Portion taken from the cash reserve
    pub from_cash: f64,
}

/// Pay the current month's expense
pub fn cover_expense(state: &mut PathState<'_>) -> Result<Coverage> {
    let expense = state.expense;
    let mut remaining = expense;

    let from_cash = state.cash.min(remaining).max(0.0);
    state.cash -= from_cash;
    state.cash_spent = from_cash;
    remaining -= from_cash;

    for k in 0..state.spending_order.len() {
        if remaining <= COVERAGE_EPSILON {
            break;
        }
        let id = state.spending_order[k];
        let Some(units) = units_to_cover(state, id, remaining) else {
            continue;
        };

        let raised = state.sell(id, units)?;
        let applied = raised.min(remaining);
        // overshoot from the last gross-up round is kept for later months
        state.cash += raised - applied;
        state.buckets[id.index()].activity.net_spent_home += applied;
        remaining -= applied;

        trace!(
            month = state.month,
            bucket = %id,
            units,
            raised,
            applied,
            "expense coverage sale"
        );
    }

    Ok(Coverage {
        net_spent: expense - remaining.max(0.0),
        from_cash,
    })
}

/// Units of `id` to sell so the net proceeds cover `gap`, or `None` if the
/// bucket sits at or below its floor
#[must_use]
pub fn units_to_cover(state: &PathState<'_>, id: BucketId, gap: f64) -> Option<f64> {
    let bucket = state.bucket(id);
    let price_home = state.price_home(id);
    let floor_home = bucket.config.cash_floor_months * state.expense;
    let sellable_home = state.value_home(id) - floor_home;
    if sellable_home <= COVERAGE_EPSILON || price_home <= 0.0 {
        return None;
    }
    let max_units = (sellable_home / price_home).min(bucket.holdings.units());

    let mut units = (gap / price_home).min(max_units);
    for _ in 0..MAX_GROSS_UP_ROUNDS {
        if units >= max_units {
            break;
        }
        let net = state.preview_sale_home(id, units);
        let missing = gap - net;
        if missing <= COVERAGE_EPSILON || net <= 0.0 {
            break;
        }
        units = (units + missing * units / net).min(max_units);
    }

    (units > 0.0).then_some(units)
}
