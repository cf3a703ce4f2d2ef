//! Percentile extraction for Monte Carlo aggregates

/// Linear-interpolated percentile of an already sorted slice.
///
/// `p` is a fraction in `[0, 1]`. The rank is `p * (n - 1)` and values
/// between ranks are interpolated, so the 50th percentile of `[1, 2, 3, 4]`
/// is 2.5.
#[must_use]
pub fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = p.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = (lower + 1).min(n - 1);
            let weight = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}

/// Percentiles of an unsorted sample, one result per entry of `ps`
#[must_use]
pub fn percentiles(values: &mut [f64], ps: &[f64]) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    ps.iter()
        .map(|&p| percentile_of_sorted(values, p))
        .collect()
}

/// Column-wise percentiles: `rows[path][month]` becomes one curve per
/// percentile, each indexed by month
#[must_use]
pub fn percentile_curves(rows: &[Vec<f64>], ps: &[f64]) -> Vec<Vec<f64>> {
    let columns = rows.iter().map(Vec::len).min().unwrap_or(0);
    let mut curves = vec![Vec::with_capacity(columns); ps.len()];
    let mut column = Vec::with_capacity(rows.len());

    for month in 0..columns {
        column.clear();
        column.extend(rows.iter().map(|row| row[month]));
        for (curve, value) in curves.iter_mut().zip(percentiles(&mut column, ps)) {
            curve.push(value);
        }
    }
    curves
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates_between_ranks() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile_of_sorted(&sorted, 0.5), 2.5);
        assert_eq!(percentile_of_sorted(&sorted, 0.0), 1.0);
        assert_eq!(percentile_of_sorted(&sorted, 1.0), 4.0);
        // rank 0.3
        assert!((percentile_of_sorted(&sorted, 0.1) - 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_edge_sizes() {
        assert_eq!(percentile_of_sorted(&[], 0.5), 0.0);
        assert_eq!(percentile_of_sorted(&[7.0], 0.9), 7.0);
    }

    #[test]
    fn test_percentiles_sorts_input() {
        let mut values = vec![5.0, 1.0, 3.0];
        assert_eq!(percentiles(&mut values, &[0.5, 1.0]), vec![3.0, 5.0]);
    }

    #[test]
    fn test_curves_are_per_month() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 30.0], vec![2.0, 20.0]];
        let curves = percentile_curves(&rows, &[0.0, 0.5]);
        assert_eq!(curves[0], vec![1.0, 10.0]);
        assert_eq!(curves[1], vec![2.0, 20.0]);
    }
}
