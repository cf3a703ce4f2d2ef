use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use bucketplan::report::{monte_carlo_report, path_report};
use bucketplan::runner::run_batch;
use bucketplan::{Scenario, init_logging};
use clap::Parser;
use color_eyre::eyre::WrapErr;

#[derive(Parser, Debug)]
#[command(name = "bucketplan")]
#[command(about = "Simulate retirement drawdown across investment buckets")]
struct Args {
    /// Path to the YAML scenario file
    scenario: PathBuf,

    /// Run a single path with this seed instead of a Monte Carlo batch
    #[arg(long, conflicts_with_all = ["iterations", "seed"])]
    path_seed: Option<u64>,

    /// Number of Monte Carlo paths (overrides the scenario file)
    #[arg(short = 'n', long)]
    iterations: Option<usize>,

    /// Base seed for the batch (overrides the scenario file)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Worker threads; 0 uses one per core
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Cancel the batch after this many seconds and report what completed
    #[arg(long)]
    time_limit: Option<u64>,

    /// Print results as JSON instead of a text report
    #[arg(long)]
    json: bool,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(args.log_file.as_deref(), &args.log_level)?;

    let scenario = Scenario::load(&args.scenario)?;
    let config = &scenario.simulation;

    let output = match args.path_seed {
        Some(seed) => {
            let result = bucketplan_core::simulate(config, seed)
                .wrap_err_with(|| format!("simulation failed for seed {seed}"))?;
            if args.json {
                serde_json::to_string_pretty(&result)?
            } else {
                path_report(config, &result)
            }
        }
        None => {
            let mc_config = scenario.monte_carlo_config(args.iterations, args.seed, args.threads);
            let time_limit = args.time_limit.map(Duration::from_secs);
            let summary =
                run_batch(config, &mc_config, time_limit).wrap_err("Monte Carlo batch failed")?;
            if args.json {
                serde_json::to_string_pretty(&summary)?
            } else {
                monte_carlo_report(config, &summary)
            }
        }
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", output.trim_end())?;

    tracing::info!("bucketplan finished");
    Ok(())
}
