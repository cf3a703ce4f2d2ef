use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::error::{Result, SimulationError};
use crate::liquidation::cover_expense;
use crate::model::{
    Completeness, MonteCarloConfig, MonteCarloProgress, MonteCarloSummary, MonthRecord,
    PathFailure, PathResult, PathVerdict, PercentileCurve,
};
use crate::percentiles::percentile_curves;
use crate::simulation_state::PathState;
use crate::triggers::run_triggers;

/// Simulate a single path.
///
/// The configuration is validated first; nothing runs if it is invalid.
pub fn simulate(config: &SimulationConfig, seed: u64) -> Result<PathResult> {
    config.validate()?;
    run_path(config, seed, None)
}

/// Simulate a single path, stopping between months once `progress` is
/// cancelled. A cancelled path is discarded.
pub fn simulate_with_progress(
    config: &SimulationConfig,
    seed: u64,
    progress: &MonteCarloProgress,
) -> Result<PathResult> {
    config.validate()?;
    run_path(config, seed, Some(progress))
}

fn run_path(
    config: &SimulationConfig,
    seed: u64,
    progress: Option<&MonteCarloProgress>,
) -> Result<PathResult> {
    let mut state = PathState::new(config, seed);
    let mut months = Vec::with_capacity(config.duration_months as usize);

    for _ in 0..config.duration_months {
        if progress.is_some_and(MonteCarloProgress::is_cancelled) {
            return Err(SimulationError::Cancelled);
        }
        months.push(step_month(&mut state)?);
    }

    let tolerance = config.success_tolerance;
    let verdict = if months.iter().all(|m| m.expense - m.net_spent <= tolerance) {
        PathVerdict::Success
    } else {
        PathVerdict::Failure
    };
    debug!(seed, ?verdict, "path completed");

    Ok(PathResult {
        seed,
        months,
        verdict,
    })
}

/// Advance a path by one month and return that month's record.
///
/// Order within the month: market draws, trigger sell pass, trigger buy
/// pass, expense coverage.
pub fn step_month(state: &mut PathState<'_>) -> Result<MonthRecord> {
    state.begin_month();
    state.advance_market();
    run_triggers(state)?;
    let coverage = cover_expense(state)?;
    let record = state.record(coverage.net_spent);
    state.month += 1;
    Ok(record)
}

/// Run a Monte Carlo batch.
///
/// Path `i` uses seed `base_seed + i`. Paths that hit a ledger error are
/// excluded from the aggregates and listed in `failures`. If `progress` is
/// cancelled the summary covers the fully completed paths and is marked
/// `Completeness::Partial`.
pub fn monte_carlo_simulate(
    config: &SimulationConfig,
    mc_config: &MonteCarloConfig,
    progress: &MonteCarloProgress,
) -> Result<MonteCarloSummary> {
    config.validate()?;
    mc_config.validate()?;

    info!(
        iterations = mc_config.iterations,
        base_seed = mc_config.base_seed,
        months = config.duration_months,
        "starting Monte Carlo batch"
    );

    let outcomes = run_paths(config, mc_config, progress)?;
    let summary = summarize(mc_config, outcomes);

    info!(
        completed = summary.completed,
        success_rate = summary.success_rate,
        partial = summary.is_partial(),
        "Monte Carlo batch finished"
    );
    Ok(summary)
}

fn run_indexed(
    config: &SimulationConfig,
    mc_config: &MonteCarloConfig,
    progress: &MonteCarloProgress,
    index: usize,
) -> Result<PathResult> {
    if progress.is_cancelled() {
        return Err(SimulationError::Cancelled);
    }
    let result = run_path(config, mc_config.path_seed(index), Some(progress));
    if result.is_ok() {
        progress.increment();
    }
    result
}

#[cfg(feature = "parallel")]
fn run_paths(
    config: &SimulationConfig,
    mc_config: &MonteCarloConfig,
    progress: &MonteCarloProgress,
) -> Result<Vec<Result<PathResult>>> {
    use rayon::iter::{IntoParallelIterator, ParallelIterator};

    let mut builder = rayon::ThreadPoolBuilder::new();
    if mc_config.concurrency > 0 {
        builder = builder.num_threads(mc_config.concurrency);
    }
    let pool = builder
        .build()
        .map_err(|e| SimulationError::ThreadPool(e.to_string()))?;

    // collect keeps index order regardless of scheduling
    Ok(pool.install(|| {
        (0..mc_config.iterations)
            .into_par_iter()
            .map(|i| run_indexed(config, mc_config, progress, i))
            .collect()
    }))
}

#[cfg(not(feature = "parallel"))]
fn run_paths(
    config: &SimulationConfig,
    mc_config: &MonteCarloConfig,
    progress: &MonteCarloProgress,
) -> Result<Vec<Result<PathResult>>> {
    Ok((0..mc_config.iterations)
        .map(|i| run_indexed(config, mc_config, progress, i))
        .collect())
}

/// Fold path outcomes into a summary, in path-index order
fn summarize(
    mc_config: &MonteCarloConfig,
    outcomes: Vec<Result<PathResult>>,
) -> MonteCarloSummary {
    let requested = outcomes.len();
    let mut completeness = Completeness::Full;
    let mut failures = Vec::new();
    let mut paths = Vec::with_capacity(requested);

    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(path) => paths.push(path),
            Err(SimulationError::Cancelled) => completeness = Completeness::Partial,
            Err(err) => {
                let seed = mc_config.path_seed(index);
                warn!(index, seed, error = %err, "path excluded from aggregates");
                failures.push(PathFailure {
                    index,
                    seed,
                    message: err.to_string(),
                });
            }
        }
    }

    let completed = paths.len();
    let success_count = paths.iter().filter(|p| p.is_success()).count();
    let (success_rate, mean_final_value_home) = if completed == 0 {
        (0.0, 0.0)
    } else {
        let total: f64 = paths.iter().map(PathResult::final_value_home).sum();
        (
            success_count as f64 / completed as f64,
            total / completed as f64,
        )
    };

    MonteCarloSummary {
        requested,
        completed,
        completeness,
        success_count,
        success_rate,
        mean_final_value_home,
        curves: build_curves(&paths, &mc_config.percentiles),
        failures,
    }
}

fn build_curves(paths: &[PathResult], ps: &[f64]) -> Vec<PercentileCurve> {
    let series = |f: &dyn Fn(&MonthRecord) -> f64| -> Vec<Vec<f64>> {
        paths
            .iter()
            .map(|p| p.months.iter().map(f).collect())
            .collect()
    };

    let total = percentile_curves(&series(&MonthRecord::total_value_home), ps);
    let net_spent = percentile_curves(&series(&|m: &MonthRecord| m.net_spent), ps);
    let expense = percentile_curves(&series(&|m: &MonthRecord| m.expense), ps);

    let bucket_count = paths
        .first()
        .and_then(|p| p.months.first())
        .map_or(0, |m| m.buckets.len());
    let per_bucket: Vec<Vec<Vec<f64>>> = (0..bucket_count)
        .map(|b| percentile_curves(&series(&|m: &MonthRecord| m.buckets[b].value_home), ps))
        .collect();

    ps.iter()
        .enumerate()
        .map(|(i, &percentile)| PercentileCurve {
            percentile,
            total_value_home: total[i].clone(),
            net_spent: net_spent[i].clone(),
            expense: expense[i].clone(),
            bucket_values_home: per_bucket.iter().map(|curves| curves[i].clone()).collect(),
        })
        .collect()
}
