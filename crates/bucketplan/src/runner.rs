//! Runs a Monte Carlo batch on a worker thread while the calling thread
//! reports progress and enforces an optional time limit.

use std::panic;
use std::thread;
use std::time::{Duration, Instant};

use bucketplan_core::model::{MonteCarloConfig, MonteCarloProgress, MonteCarloSummary};
use bucketplan_core::{SimulationConfig, SimulationError, monte_carlo_simulate};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const REPORT_INTERVAL: Duration = Duration::from_secs(2);

/// Run a batch, cancelling it once `time_limit` has passed.
///
/// A cancelled batch still returns a summary, marked partial.
pub fn run_batch(
    config: &SimulationConfig,
    mc_config: &MonteCarloConfig,
    time_limit: Option<Duration>,
) -> Result<MonteCarloSummary, SimulationError> {
    let progress = MonteCarloProgress::new();
    let started = Instant::now();

    thread::scope(|scope| {
        let worker = {
            let progress = progress.clone();
            scope.spawn(move || monte_carlo_simulate(config, mc_config, &progress))
        };

        let mut last_report = started;
        while !worker.is_finished() {
            thread::sleep(POLL_INTERVAL);

            if time_limit.is_some_and(|limit| started.elapsed() >= limit)
                && !progress.is_cancelled()
            {
                tracing::warn!(
                    completed = progress.completed(),
                    requested = mc_config.iterations,
                    "time limit reached, cancelling batch"
                );
                progress.cancel();
            }

            if last_report.elapsed() >= REPORT_INTERVAL {
                tracing::info!(
                    completed = progress.completed(),
                    requested = mc_config.iterations,
                    "Monte Carlo progress"
                );
                last_report = Instant::now();
            }
        }

        match worker.join() {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        }
    })
}
