//! Foreign-currency buckets
//!
//! These tests verify:
//! - Expenses paid from a foreign bucket are grossed up for conversion fees
//! - Records carry prices and values in both currencies
//! - Transfers between currencies pay both conversion fees

use crate::config::{BucketBuilder, SimulationBuilder};
use crate::model::{BucketId, FxSettings, VolatilityProfile};
use crate::simulation::simulate;

fn euro(rate: f64, fee_pct: f64) -> FxSettings {
    let mut settings = FxSettings::fixed("EUR", rate);
    settings.conversion_fee_pct = fee_pct;
    settings
}

#[test]
fn test_foreign_bucket_pays_home_expense() {
    let config = SimulationBuilder::new()
        .months(12)
        .no_inflation()
        .home_currency("USD")
        .currency(euro(1.2, 1.0))
        .monthly_expense(1_000.0)
        .bucket(BucketBuilder::new("Euro Cash", "EUR").units(50_000.0))
        .build();

    let result = simulate(&config, 0).unwrap();
    assert!(result.is_success());

    let first = &result.months[0];
    let bucket = first.bucket(BucketId(0)).unwrap();
    let sold_eur = 1_000.0 / (1.2 * 0.99);
    assert!((bucket.sold - sold_eur).abs() < 1e-6);
    assert!((bucket.sold_home - sold_eur * 1.2).abs() < 1e-6);
    assert!((bucket.fees_home - sold_eur * 1.2 * 0.01).abs() < 1e-6);
    assert!((bucket.net_spent_home - 1_000.0).abs() < 1e-6);

    assert_eq!(bucket.price, 1.0);
    assert!((bucket.price_home - 1.2).abs() < 1e-12);
    assert!((bucket.value_home - bucket.value * 1.2).abs() < 1e-9);
    assert_eq!(first.fx_rates, vec![1.2]);
}

#[test]
fn test_cross_currency_transfer_pays_both_conversion_fees() {
    let mut chf = FxSettings::fixed("CHF", 1.1);
    chf.conversion_fee_pct = 0.5;
    let config = SimulationBuilder::new()
        .months(1)
        .no_inflation()
        .capital_gains_tax_pct(0.0)
        .currency(euro(1.2, 1.0))
        .currency(chf)
        .bucket(BucketBuilder::new("Euro Cash", "EUR").units(1_000.0).priority(0))
        .bucket(
            BucketBuilder::new("Swiss Bonds", "CHF")
                .units(0.0)
                .priority(1)
                .share_below(10.0, "Euro Cash"),
        )
        .build();

    let result = simulate(&config, 0).unwrap();
    let month = &result.months[0];
    let euro_bucket = month.bucket(BucketId(0)).unwrap();
    let swiss = month.bucket(BucketId(1)).unwrap();

    // 10% of 1200 USD
    assert!((euro_bucket.sold_home - 120.0).abs() < 1e-9);
    assert!((euro_bucket.fees_home - 1.2).abs() < 1e-9);
    let arrived_home = 118.8;
    assert!((swiss.fees_home - arrived_home * 0.005).abs() < 1e-9);
    assert!((swiss.bought - arrived_home * 0.995 / 1.1).abs() < 1e-9);
}

#[test]
fn test_volatile_fx_moves_home_values() {
    let mut settings = euro(1.1, 0.0);
    settings.min_rate = 0.8;
    settings.max_rate = 1.4;
    settings.volatility = VolatilityProfile::Crazy;
    let config = SimulationBuilder::new()
        .months(36)
        .no_inflation()
        .currency(settings)
        .bucket(BucketBuilder::new("Euro Cash", "EUR").units(10_000.0))
        .build();

    let result = simulate(&config, 9).unwrap();
    let rates: Vec<f64> = result.months.iter().map(|m| m.fx_rates[0]).collect();

    assert!(rates.iter().all(|r| (0.8..=1.4).contains(r)));
    assert!(rates.windows(2).any(|w| w[0] != w[1]));
    for month in &result.months {
        let bucket = month.bucket(BucketId(0)).unwrap();
        assert!((bucket.value_home - 10_000.0 * month.fx_rates[0]).abs() < 1e-6);
    }
}
