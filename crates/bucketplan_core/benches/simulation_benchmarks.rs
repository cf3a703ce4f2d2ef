//! Criterion benchmarks for bucketplan_core simulation
//!
//! Run with: cargo bench -p bucketplan_core

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use bucketplan_core::config::{BucketBuilder, SimulationBuilder, SimulationConfig};
use bucketplan_core::model::{
    CostBasisMethod, ExpensePeriod, FxSettings, MonteCarloConfig, MonteCarloProgress,
    VolatilityProfile,
};
use bucketplan_core::simulation::{monte_carlo_simulate, simulate};

fn create_basic_config(years: u32) -> SimulationConfig {
    SimulationBuilder::new()
        .start(2025, 1, 1)
        .years(years)
        .monthly_expense(3_000.0)
        .bucket(BucketBuilder::new("Cash", "USD").units(60_000.0).priority(0))
        .bucket(
            BucketBuilder::new("Stocks", "USD")
                .price(100.0)
                .units(8_000.0)
                .growth(-30.0, 30.0, 7.0)
                .equity()
                .priority(1),
        )
        .build()
}

fn create_rebalancing_config() -> SimulationConfig {
    let mut eur = FxSettings::fixed("EUR", 1.1);
    eur.min_rate = 0.9;
    eur.max_rate = 1.3;
    eur.volatility = VolatilityProfile::Mild;
    eur.conversion_fee_pct = 0.25;

    SimulationBuilder::new()
        .start(2025, 1, 1)
        .years(30)
        .capital_gains_tax_pct(20.0)
        .currency(eur)
        .expense_period(ExpensePeriod {
            start_month: 0,
            amount_min: 2_500.0,
            amount_max: 4_500.0,
            amount_avg: 3_500.0,
            volatility: VolatilityProfile::Moderate,
        })
        .bucket(
            BucketBuilder::new("Cash", "USD")
                .units(50_000.0)
                .cash_floor_months(1.0)
                .priority(0),
        )
        .bucket(
            BucketBuilder::new("Bonds", "USD")
                .price(100.0)
                .value(200_000.0)
                .growth(-5.0, 8.0, 3.5)
                .volatility(VolatilityProfile::Mild)
                .cost_basis(CostBasisMethod::Avco)
                .priority(1),
        )
        .bucket(
            BucketBuilder::new("Euro Stocks", "EUR")
                .price(50.0)
                .value(500_000.0)
                .growth(-40.0, 40.0, 7.0)
                .equity()
                .fee_pct(0.2)
                .cost_basis(CostBasisMethod::Fifo)
                .target_growth(6.0)
                .runway_months(6.0)
                .priority(2)
                .take_profit(1.5, "Cash")
                .share_below(40.0, "Bonds")
                .yearly()
                .share_exceeds(80.0, "Bonds"),
        )
        .build()
}

fn bench_basic_simulation(c: &mut Criterion) {
    let config = create_basic_config(30);

    c.bench_function("basic_30yr_simulation", |b| {
        b.iter(|| simulate(black_box(&config), black_box(42)))
    });
}

fn bench_rebalancing(c: &mut Criterion) {
    let config = create_rebalancing_config();

    c.bench_function("rebalancing_30yr", |b| {
        b.iter(|| simulate(black_box(&config), black_box(42)))
    });
}

fn bench_monte_carlo(c: &mut Criterion) {
    let mut group = c.benchmark_group("monte_carlo");
    let config = create_rebalancing_config();

    for iterations in [100, 500, 1000].iter() {
        let mc_config = MonteCarloConfig {
            iterations: *iterations,
            percentiles: vec![0.05, 0.25, 0.50, 0.75, 0.95],
            ..Default::default()
        };

        group.bench_with_input(
            BenchmarkId::new("iterations", iterations),
            iterations,
            |b, _| {
                b.iter(|| {
                    monte_carlo_simulate(
                        black_box(&config),
                        black_box(&mc_config),
                        &MonteCarloProgress::new(),
                    )
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_basic_simulation,
    bench_rebalancing,
    bench_monte_carlo,
);
criterion_main!(benches);
