//! Lot ledger with FIFO, LIFO and average-cost accounting
//!
//! `Holdings` only knows about units and cost. Fees and tax are applied one
//! level up, in `simulation_state::BucketState`, which turns a disposal into
//! money.

use std::collections::VecDeque;

use crate::error::LedgerError;
use crate::model::{CostBasisMethod, Lot};

/// Relative slack allowed when a computed sale lands a hair above holdings
const UNIT_TOLERANCE: f64 = 1e-9;

/// Lots below this size are dropped after a partial sale
const DUST_UNITS: f64 = 1e-12;

/// Result of removing units from a ledger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Disposal {
    pub units: f64,
    /// Total cost of the consumed units
    pub cost_basis: f64,
    /// `units * price`, before any fee
    pub proceeds: f64,
    /// `proceeds - cost_basis`; negative for a loss
    pub realized_gain: f64,
    /// Units taken from each lot, in consumption order
    pub consumed: Vec<Lot>,
}

/// The lots held by one bucket
#[derive(Debug, Clone, PartialEq)]
pub struct Holdings {
    method: CostBasisMethod,
    lots: VecDeque<Lot>,
    units: f64,
}

impl Holdings {
    #[must_use]
    pub fn new(method: CostBasisMethod) -> Self {
        Self {
            method,
            lots: VecDeque::new(),
            units: 0.0,
        }
    }

    /// Holdings seeded with a single opening lot
    #[must_use]
    pub fn with_opening_lot(method: CostBasisMethod, units: f64, unit_cost: f64) -> Self {
        let mut holdings = Self::new(method);
        holdings.add_lot(Lot {
            units,
            unit_cost,
            acquired_month: 0,
        });
        holdings
    }

    #[must_use]
    pub fn method(&self) -> CostBasisMethod {
        self.method
    }

    #[must_use]
    pub fn units(&self) -> f64 {
        self.units
    }

    #[must_use]
    pub fn lots(&self) -> &VecDeque<Lot> {
        &self.lots
    }

    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.lots.iter().map(Lot::cost).sum()
    }

    /// Weighted average unit cost of everything held
    #[must_use]
    pub fn average_cost(&self) -> f64 {
        if self.units <= 0.0 {
            return 0.0;
        }
        self.total_cost() / self.units
    }

    /// Append a lot, or fold it into the running lot under AVCO.
    pub fn add_lot(&mut self, lot: Lot) {
        if lot.units <= 0.0 {
            return;
        }

        match self.method {
            CostBasisMethod::Avco => {
                if let Some(running) = self.lots.front_mut() {
                    let total_units = running.units + lot.units;
                    running.unit_cost = (running.cost() + lot.cost()) / total_units;
                    running.units = total_units;
                } else {
                    self.lots.push_back(lot);
                }
            }
            CostBasisMethod::Fifo | CostBasisMethod::Lifo => self.lots.push_back(lot),
        }
        self.units += lot.units;
    }

    /// Buy `amount` worth at `price`, returning the units credited
    pub fn buy(&mut self, amount: f64, price: f64, month: u32) -> f64 {
        if amount <= 0.0 || price <= 0.0 {
            return 0.0;
        }
        let units = amount / price;
        self.add_lot(Lot {
            units,
            unit_cost: price,
            acquired_month: month,
        });
        units
    }

    /// Cost basis that selling `units` would consume, without selling
    #[must_use]
    pub fn preview_cost(&self, units: f64) -> f64 {
        let mut remaining = units.min(self.units).max(0.0);
        let mut cost = 0.0;
        let mut take = |lot: &Lot| {
            let take_units = remaining.min(lot.units);
            remaining -= take_units;
            cost += take_units * lot.unit_cost;
            remaining > 0.0
        };
        match self.method {
            CostBasisMethod::Fifo | CostBasisMethod::Avco => {
                for lot in &self.lots {
                    if !take(lot) {
                        break;
                    }
                }
            }
            CostBasisMethod::Lifo => {
                for lot in self.lots.iter().rev() {
                    if !take(lot) {
                        break;
                    }
                }
            }
        }
        cost
    }

    /// Remove `units` at `price`, consuming lots per the cost basis method.
    ///
    /// Requests within rounding error of holdings are trimmed to holdings;
    /// anything larger is `InsufficientUnits`.
    pub fn sell(&mut self, units: f64, price: f64) -> Result<Disposal, LedgerError> {
        if units <= 0.0 {
            return Ok(Disposal::default());
        }
        if units > self.units + UNIT_TOLERANCE * self.units.max(1.0) {
            return Err(LedgerError::InsufficientUnits {
                requested: units,
                held: self.units,
            });
        }
        let units = units.min(self.units);

        let mut disposal = Disposal {
            units,
            proceeds: units * price,
            ..Default::default()
        };

        let mut remaining = units;
        while remaining > 0.0 {
            let lot = match self.method {
                CostBasisMethod::Fifo | CostBasisMethod::Avco => self.lots.front_mut(),
                CostBasisMethod::Lifo => self.lots.back_mut(),
            };
            let Some(lot) = lot else {
                break;
            };

            let take_units = remaining.min(lot.units);
            lot.units -= take_units;
            remaining -= take_units;
            disposal.cost_basis += take_units * lot.unit_cost;
            disposal.consumed.push(Lot {
                units: take_units,
                ..*lot
            });

            if lot.units <= DUST_UNITS {
                match self.method {
                    CostBasisMethod::Fifo | CostBasisMethod::Avco => self.lots.pop_front(),
                    CostBasisMethod::Lifo => self.lots.pop_back(),
                };
            }
        }

        self.units = self.lots.iter().map(|l| l.units).sum();
        disposal.realized_gain = disposal.proceeds - disposal.cost_basis;
        Ok(disposal)
    }
}
