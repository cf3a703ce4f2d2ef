//! Scenario tests for the bucketplan simulation engine
//!
//! Tests are organized by topic:
//! - `basic` - Core path mechanics: expenses, inflation, shortfalls
//! - `rebalancing` - Triggers running inside full paths
//! - `currencies` - Foreign-currency buckets and conversion fees
//! - `monte_carlo` - Batches, determinism and cancellation
//! - `validation` - Configuration errors
//! - `builder_dsl` - Builder DSL for fluent simulation setup

mod currencies;
mod rebalancing;
