//! Provide traits for different classes of algorithms
use crate::dataset::{DatasetBase, Records};
use ndarray::{ArrayBase, Data, Ix2};

// The `Predict` blanket impls below cover the common call shapes: a
// reference to a bare record matrix and a reference to a whole dataset.

/// Fit a model on a whole dataset at once
///
/// An algorithm that implements `Fit` consumes a dataset in one pass and
/// returns a fitted model, or an error when the dataset violates the
/// algorithm's input contract.
pub trait Fit<R: Records, T, E: std::error::Error> {
    type Object;

    fn fit(&self, dataset: &DatasetBase<R, T>) -> Result<Self::Object, E>;
}

/// Incremental estimation on a sequence of dataset chunks
///
/// `fit_with` merges a chunk into a partially fitted model. Passing
/// `ObjectIn` as `None` (the usual choice) starts a fresh model from the
/// first chunk; passing the previous output continues it. The model
/// returned after every call is fully usable for prediction, so training
/// can be interleaved with inference.
pub trait FitWith<'a, R: Records, T, E: std::error::Error> {
    type ObjectIn;
    type ObjectOut;

    fn fit_with(
        &self,
        model: Self::ObjectIn,
        dataset: &'a DatasetBase<R, T>,
    ) -> Result<Self::ObjectOut, E>;
}

/// Predict into a pre-allocated target container
pub trait PredictInplace<R, T> {
    /// Predict something in place
    fn predict_inplace(&self, x: &R, y: &mut T);

    /// Create targets that `predict_inplace` works with
    fn default_target(&self, x: &R) -> T;
}

/// Predict with the result allocated by the model
pub trait Predict<R, T> {
    fn predict(&self, x: R) -> T;
}

impl<'a, D, T, O> Predict<&'a ArrayBase<D, Ix2>, T> for O
where
    D: Data,
    O: PredictInplace<ArrayBase<D, Ix2>, T>,
{
    fn predict(&self, records: &'a ArrayBase<D, Ix2>) -> T {
        let mut targets = self.default_target(records);
        self.predict_inplace(records, &mut targets);
        targets
    }
}

impl<'a, R: Records, T, S, O> Predict<&'a DatasetBase<R, T>, S> for O
where
    O: PredictInplace<R, S>,
{
    fn predict(&self, dataset: &'a DatasetBase<R, T>) -> S {
        let mut targets = self.default_target(&dataset.records);
        self.predict_inplace(&dataset.records, &mut targets);
        targets
    }
}
