//! Statistical helpers shared by stagnation, reporting and the
//! aggregation registry.

use crate::errors::LookupError;

/// Arithmetic mean. Empty input yields `0.0`.
///
/// # Examples
/// ```
/// use neatgen::math_util::mean;
///
/// assert_eq!(mean(&[1.0, 2.0, 6.0]), 3.0);
/// assert_eq!(mean(&[]), 0.0);
/// ```
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1 denominator).
/// Fewer than two values yield `0.0`.
pub fn stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (variance / (values.len() - 1) as f64).sqrt()
}

pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Maximum value, or negative infinity for empty input.
pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Minimum value, or positive infinity for empty input.
pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Median over a sorted copy of the input. Empty input yields NaN.
///
/// # Examples
/// ```
/// use neatgen::math_util::median;
///
/// assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
/// assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
/// ```
pub fn median(values: &[f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("NaN in median input"));
    let mid = n / 2;
    if n % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Resolves a named statistic, as referenced by `species_fitness_func`
/// and `fitness_criterion` in the configuration.
///
/// # Examples
/// ```
/// use neatgen::math_util::stat_function;
///
/// let max = stat_function("max").unwrap();
/// assert_eq!(max(&[1.0, 5.0, 3.0]), 5.0);
/// assert!(stat_function("harmonic").is_err());
/// ```
pub fn stat_function(name: &str) -> Result<fn(&[f64]) -> f64, LookupError> {
    match name {
        "mean" => Ok(mean),
        "stdev" => Ok(stdev),
        "sum" => Ok(sum),
        "max" => Ok(max),
        "min" => Ok(min),
        "median" => Ok(median),
        _ => Err(LookupError::new("stat function", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn mean_and_sum() {
        assert_abs_diff_eq!(mean(&[-2.0, -1.0, 0.5, 1.0, 1.5]), 0.0);
        assert_abs_diff_eq!(sum(&[1.0, 2.0, 3.5]), 6.5);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn stdev_sample() {
        assert_eq!(stdev(&[]), 0.0);
        assert_eq!(stdev(&[4.2]), 0.0);
        assert_abs_diff_eq!(stdev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.138, epsilon = 1e-3);
    }

    #[test]
    fn extrema_sentinels() {
        assert_eq!(max(&[]), f64::NEG_INFINITY);
        assert_eq!(min(&[]), f64::INFINITY);
        assert_eq!(max(&[1.0, 3.0, 2.0]), 3.0);
        assert_eq!(min(&[1.0, 3.0, 2.0]), 1.0);
    }

    #[test]
    fn median_odd_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn stat_function_lookup() {
        let f = stat_function("median").unwrap();
        assert_eq!(f(&[1.0, 2.0, 9.0]), 2.0);
        assert!(stat_function("harmonic").is_err());
    }
}
