//! Additive (Laplace/Lidstone) smoothing
//!
//! The smoothing policy is stateless and shared by the Multinomial,
//! Complement and Categorical variants, each passing its own cardinality:
//! the vocabulary size, the feature count, or a feature's category count.
//!
//! `alpha = 1` is Laplace smoothing, `0 < alpha < 1` Lidstone. `alpha = 0`
//! is permitted but leaves unseen events with zero probability — their log
//! probability becomes `-inf` and the caller carries that trade-off.
use savia::Float;

/// `(numerator + alpha) / (denominator + alpha * cardinality)`
///
/// For any `alpha > 0` the result lies in `(0, 1]` whenever
/// `0 <= numerator <= denominator`, and the smoothed probabilities of the
/// `cardinality` disjoint events sum to one.
pub fn smoothed_ratio<F: Float>(numerator: F, denominator: F, alpha: F, cardinality: usize) -> F {
    (numerator + alpha) / (denominator + alpha * F::cast(cardinality))
}

/// Log of [`smoothed_ratio`], the form every variant stores
pub fn smoothed_log_ratio<F: Float>(
    numerator: F,
    denominator: F,
    alpha: F,
    cardinality: usize,
) -> F {
    smoothed_ratio(numerator, denominator, alpha, cardinality).ln()
}
