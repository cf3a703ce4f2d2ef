//! Command-line runner for bucket-based retirement drawdown scenarios
//!
//! Loads a YAML scenario, runs either a single seeded path or a Monte Carlo
//! batch through `bucketplan_core`, and renders the outcome as a text report
//! or JSON.

pub mod logging;
pub mod report;
pub mod runner;
pub mod scenario;

pub use logging::init_logging;
pub use scenario::Scenario;
