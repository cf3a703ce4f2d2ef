//! Bucket-strategy retirement simulation library
//!
//! This crate simulates a portfolio of investment buckets, each with its own
//! currency, growth assumptions and rebalancing rules, paying an inflating
//! monthly expense over a fixed horizon. It supports:
//! - Stochastic prices, FX rates, inflation and expenses from a seeded generator
//! - FIFO, LIFO and average-cost lot accounting with flat capital gains tax
//! - Take-profit, share and discount triggers moving money between buckets
//! - Expense coverage in spending-priority order with per-bucket cash floors
//! - Monte Carlo batches with percentile curves and cooperative cancellation
//!
//! # Builder DSL
//!
//! ```ignore
//! use bucketplan_core::config::{BucketBuilder, SimulationBuilder};
//! use bucketplan_core::simulation::simulate;
//!
//! let config = SimulationBuilder::new()
//!     .years(30)
//!     .monthly_expense(3_000.0)
//!     .bucket(BucketBuilder::new("Cash", "USD").units(60_000.0).priority(0))
//!     .bucket(
//!         BucketBuilder::new("Stocks", "USD")
//!             .price(100.0)
//!             .units(5_000.0)
//!             .growth(-30.0, 30.0, 7.0)
//!             .equity()
//!             .target_growth(6.0)
//!             .priority(1)
//!             .take_profit(1.5, "Cash"),
//!     )
//!     .build();
//!
//! let path = simulate(&config, 42)?;
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod error;
pub mod ledger;
pub mod liquidation;
pub mod market;
pub mod percentiles;
pub mod simulation;
pub mod simulation_state;
pub mod taxes;
pub mod triggers;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use config::{BucketBuilder, SimulationBuilder, SimulationConfig};
pub use error::{ConfigError, LedgerError, SimulationError};
pub use simulation::{monte_carlo_simulate, simulate, simulate_with_progress};
