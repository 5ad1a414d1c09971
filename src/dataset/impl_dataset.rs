use super::{AsSingleTargets, DatasetBase, Dataset, Labels, Records};
use ndarray::{Array1, Array2, ArrayView1};

impl<R: Records, T> DatasetBase<R, T> {
    /// Create a new dataset from records and targets
    ///
    /// The dataset is created without sample weights; all samples count
    /// equally until [`with_weights`](DatasetBase::with_weights) is called.
    pub fn new(records: R, targets: T) -> DatasetBase<R, T> {
        DatasetBase {
            records,
            targets,
            weights: Array1::zeros(0),
        }
    }

    /// Returns a reference to the records
    pub fn records(&self) -> &R {
        &self.records
    }

    /// Returns a reference to the targets
    pub fn targets(&self) -> &T {
        &self.targets
    }

    /// Returns the per-sample weights, if any were supplied
    pub fn weights(&self) -> Option<ArrayView1<f32>> {
        if self.weights.is_empty() {
            None
        } else {
            Some(self.weights.view())
        }
    }

    /// Returns the weight of the `idx`th sample, defaulting to `1.0` for
    /// unweighted datasets
    pub fn weight_for(&self, idx: usize) -> f32 {
        self.weights.get(idx).copied().unwrap_or(1.0)
    }

    /// Attach per-sample weights to the dataset
    pub fn with_weights(mut self, weights: Array1<f32>) -> DatasetBase<R, T> {
        self.weights = weights;
        self
    }
}

impl<R: Records, T: AsSingleTargets> DatasetBase<R, T> {
    /// Returns a view on the single target variable of each sample
    pub fn as_single_targets(&self) -> ArrayView1<T::Elem> {
        self.targets.as_single_targets()
    }
}

impl<R: Records, T: Labels> DatasetBase<R, T> {
    /// Returns the unique labels of the targets, in no particular order
    pub fn labels(&self) -> Vec<T::Elem> {
        self.targets.labels()
    }
}

impl<F, L> From<(Array2<F>, Array1<L>)> for Dataset<F, L> {
    fn from(rec_tar: (Array2<F>, Array1<L>)) -> Self {
        DatasetBase::new(rec_tar.0, rec_tar.1)
    }
}

#[cfg(test)]
mod tests {
    use crate::dataset::{Dataset, DatasetView, Records};
    use ndarray::array;

    #[test]
    fn dataset_accessors() {
        let records = array![[1.0f64, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let targets = array![0usize, 1, 0];
        let ds = Dataset::new(records, targets);

        assert_eq!(ds.nsamples(), 3);
        assert_eq!(ds.nfeatures(), 2);
        assert!(ds.weights().is_none());
        assert_eq!(ds.weight_for(1), 1.0);

        let mut labels = ds.labels();
        labels.sort_unstable();
        assert_eq!(labels, vec![0, 1]);

        let ds = ds.with_weights(array![1.0, 2.0, 0.5]);
        assert_eq!(ds.weight_for(1), 2.0);
        assert_eq!(ds.weights().unwrap().len(), 3);
    }

    #[test]
    fn dataset_view() {
        let records = array![[1.0f64, 2.0], [3.0, 4.0]];
        let targets = array![1usize, 2];
        let ds = DatasetView::new(records.view(), targets.view());

        assert_eq!(ds.nsamples(), 2);
        assert_eq!(ds.as_single_targets().to_vec(), vec![1, 2]);
    }
}
