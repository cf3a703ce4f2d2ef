//! Plain-text reports for the terminal

use std::fmt::Write;

use bucketplan_core::SimulationConfig;
use bucketplan_core::model::{MonteCarloSummary, PathResult, PathVerdict};

fn money(value: f64) -> String {
    format!("{value:>14.2}")
}

/// Summarize a single path: totals, final bucket values and a yearly table.
pub fn path_report(config: &SimulationConfig, result: &PathResult) -> String {
    let mut out = String::new();
    let verdict = match result.verdict {
        PathVerdict::Success => "success",
        PathVerdict::Failure => "failure",
    };
    let shortfalls = result
        .shortfall_months(config.success_tolerance)
        .count();

    let _ = writeln!(out, "Path (seed {}): {verdict}", result.seed);
    let _ = writeln!(out, "  months simulated   {:>14}", result.months.len());
    let _ = writeln!(out, "  shortfall months   {shortfalls:>14}");
    let _ = writeln!(out, "  total expense      {}", money(result.total_expense()));
    let _ = writeln!(out, "  total net spent    {}", money(result.total_net_spent()));
    let _ = writeln!(out, "  fees paid          {}", money(result.total_fees_home()));
    let _ = writeln!(out, "  tax paid           {}", money(result.total_tax_home()));
    let _ = writeln!(
        out,
        "  final value ({})  {}",
        config.home_currency,
        money(result.final_value_home())
    );

    if let Some(last) = result.months.last() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Final buckets ({})", config.home_currency);
        for (bucket, record) in config.buckets.iter().zip(&last.buckets) {
            let _ = writeln!(out, "  {:<18} {}", bucket.name, money(record.value_home));
        }
        if last.cash_balance > 0.0 {
            let _ = writeln!(out, "  {:<18} {}", "cash reserve", money(last.cash_balance));
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<10} {:>14} {:>14} {:>14}",
        "month", "value", "expense", "net spent"
    );
    for record in result
        .months
        .iter()
        .filter(|m| m.month % 12 == 11 || m.month + 1 == result.months.len() as u32)
    {
        let _ = writeln!(
            out,
            "{:<10} {} {} {}",
            record.date.strftime("%Y-%m").to_string(),
            money(record.total_value_home()),
            money(record.expense),
            money(record.net_spent)
        );
    }
    out
}

/// Summarize a Monte Carlo batch: success rate and final-month percentiles.
pub fn monte_carlo_report(config: &SimulationConfig, summary: &MonteCarloSummary) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Monte Carlo: {}/{} paths completed{}",
        summary.completed,
        summary.requested,
        if summary.is_partial() { " (partial)" } else { "" }
    );
    let _ = writeln!(
        out,
        "  success rate       {:>13.1}%",
        summary.success_rate * 100.0
    );
    let _ = writeln!(
        out,
        "  mean final value   {}",
        money(summary.mean_final_value_home)
    );

    if !summary.failures.is_empty() {
        let _ = writeln!(out, "  excluded paths     {:>14}", summary.failures.len());
        for failure in &summary.failures {
            let _ = writeln!(
                out,
                "    path {} (seed {}): {}",
                failure.index, failure.seed, failure.message
            );
        }
    }

    if summary.completed == 0 {
        return out;
    }

    let _ = writeln!(out);
    let _ = write!(out, "{:<18}", "final value");
    for curve in &summary.curves {
        let _ = write!(out, " {:>14}", format!("p{:.0}", curve.percentile * 100.0));
    }
    let _ = writeln!(out);

    let _ = write!(out, "{:<18}", "total");
    for curve in &summary.curves {
        let _ = write!(out, " {}", money(curve.total_value_home.last().copied().unwrap_or(0.0)));
    }
    let _ = writeln!(out);

    for (b, bucket) in config.buckets.iter().enumerate() {
        let _ = write!(out, "{:<18}", bucket.name);
        for curve in &summary.curves {
            let value = curve
                .bucket_values_home
                .get(b)
                .and_then(|series| series.last())
                .copied()
                .unwrap_or(0.0);
            let _ = write!(out, " {}", money(value));
        }
        let _ = writeln!(out);
    }
    out
}
