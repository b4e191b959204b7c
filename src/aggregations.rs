//! Registry of node aggregation functions: reducers applied to a
//! node's weighted input values before bias, response and activation.

use crate::errors::LookupError;
use crate::math_util;

/// A reducer over a node's incoming weighted values.
pub type AggregationFn = fn(&[f64]) -> f64;

/// Resolves an aggregation function by name.
///
/// # Examples
/// ```
/// use neatgen::aggregations::aggregation;
///
/// let product = aggregation("product").unwrap();
/// assert_eq!(product(&[2.0, 3.0, 0.5]), 3.0);
/// assert!(aggregation("mode").is_err());
/// ```
pub fn aggregation(name: &str) -> Result<AggregationFn, LookupError> {
    match name {
        "sum" => Ok(math_util::sum),
        "product" => Ok(product),
        "min" => Ok(math_util::min),
        "max" => Ok(math_util::max),
        "mean" | "average" => Ok(math_util::mean),
        "median" => Ok(math_util::median),
        "maxabs" => Ok(maxabs),
        _ => Err(LookupError::new("aggregation function", name)),
    }
}

fn product(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().product()
}

fn maxabs(values: &[f64]) -> f64 {
    values.iter().copied().map(f64::abs).fold(0.0, f64::max)
}
