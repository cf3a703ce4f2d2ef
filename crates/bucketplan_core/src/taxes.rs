//! Fee, tax and currency conversion arithmetic
//!
//! Everything here is pure. Rates are fractions (0.25 for 25%), FX rates are
//! home-currency units per foreign unit.

/// Trading fee on a gross amount
#[inline]
#[must_use]
pub fn trading_fee(amount: f64, fee_rate: f64) -> f64 {
    amount.max(0.0) * fee_rate
}

/// Flat capital gains tax on a gain net of the sell fee. Losses owe nothing.
#[inline]
#[must_use]
pub fn capital_gains_tax(realized_gain: f64, sell_fee: f64, tax_rate: f64) -> f64 {
    (realized_gain - sell_fee).max(0.0) * tax_rate
}

/// Money after a currency conversion
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Conversion {
    /// Converted amount in the destination currency
    pub amount: f64,
    /// Conversion fee, in the home currency
    pub fee_home: f64,
}

/// Convert a foreign amount into the home currency, charging `fee_rate` on
/// the converted value
#[inline]
#[must_use]
pub fn foreign_to_home(amount: f64, fx_rate: f64, fee_rate: f64) -> Conversion {
    let gross = amount * fx_rate;
    let fee_home = gross * fee_rate;
    Conversion {
        amount: gross - fee_home,
        fee_home,
    }
}

/// Convert a home amount into a foreign currency, charging `fee_rate` before
/// the conversion
#[inline]
#[must_use]
pub fn home_to_foreign(amount_home: f64, fx_rate: f64, fee_rate: f64) -> Conversion {
    let fee_home = amount_home * fee_rate;
    Conversion {
        amount: (amount_home - fee_home) / fx_rate,
        fee_home,
    }
}

/// Breakdown of one sale, in the selling bucket's currency
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SaleProceeds {
    pub gross: f64,
    pub fee: f64,
    pub tax: f64,
}

impl SaleProceeds {
    #[must_use]
    pub fn compute(gross: f64, cost_basis: f64, fee_rate: f64, tax_rate: f64) -> Self {
        let fee = trading_fee(gross, fee_rate);
        let tax = capital_gains_tax(gross - cost_basis, fee, tax_rate);
        Self { gross, fee, tax }
    }

    /// What is left after fee and tax
    #[must_use]
    pub fn net(&self) -> f64 {
        self.gross - self.fee - self.tax
    }
}
