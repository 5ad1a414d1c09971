use ndarray_stats::errors::MinMaxError;
use thiserror::Error;

/// Simplified `Result` using [`NaiveBayesError`](crate::NaiveBayesError) as error type
pub type Result<T> = std::result::Result<T, NaiveBayesError>;

/// Error variants from hyperparameter construction or model estimation
///
/// Every variant is a deterministic caller-contract violation; none are
/// transient or retryable. A `fit_with` call that returns an error has not
/// merged anything — validation always precedes the statistics update.
#[derive(Error, Debug, Clone)]
pub enum NaiveBayesError {
    /// Error when performing Max operation on data
    #[error("invalid statistical operation {0}")]
    Stats(#[from] MinMaxError),
    /// Invalid smoothing parameter
    #[error("invalid smoothing parameter {0}")]
    InvalidSmoothing(f64),
    /// Invalid class prior vector
    #[error("invalid prior {0}")]
    Priors(String),
    /// Row, label and weight counts disagree, or the feature count changed
    /// between chunks
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    /// A label outside the frozen class set was encountered
    #[error("label {0} is not part of the frozen class set")]
    UnknownLabel(String),
    /// A class list was declared although the class set is already frozen
    #[error("the class set can only be declared before the first fit call")]
    ClassesAlreadyFrozen,
    /// A negative weight or feature value where non-negativity is required
    #[error("negative value: {0}")]
    NegativeValue(String),
    /// A categorical code at or beyond the fixed category cardinality
    #[error("category {category} of feature {feature} exceeds the cardinality {cardinality}")]
    CategoryOutOfRange {
        feature: usize,
        category: usize,
        cardinality: usize,
    },
    #[error(transparent)]
    BaseCrate(#[from] savia::Error),
}
