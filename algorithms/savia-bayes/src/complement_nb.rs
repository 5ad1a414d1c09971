use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Ix2};

use savia::dataset::{AsSingleTargets, DatasetBase, Labels, Records};
use savia::traits::{Fit, FitWith, PredictInplace};
use savia::{Float, Label};

use crate::base_nb::{
    check_class_prior, check_frozen_registry, check_nfeatures, check_non_negative, chunk_weights,
    estimate_priors, initial_registry, log_normalize, row_argmin, NaiveBayes,
    NaiveBayesValidParams,
};
use crate::error::{NaiveBayesError, Result};
use crate::filter;
use crate::hyperparams::{ComplementNbParams, ComplementNbValidParams};
use crate::registry::ClassRegistry;
use crate::smoothing::smoothed_log_ratio;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

impl<'a, F, L, D, T> NaiveBayesValidParams<'a, F, L, D, T> for ComplementNbValidParams<F, L>
where
    F: Float,
    L: Label + Ord + 'a,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = L> + Labels<Elem = L>,
{
}

impl<F, L, D, T> Fit<ArrayBase<D, Ix2>, T, NaiveBayesError> for ComplementNbValidParams<F, L>
where
    F: Float,
    L: Label + Ord,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = L> + Labels<Elem = L>,
{
    type Object = ComplementNb<F, L>;

    // Thin wrapper around the corresponding method of NaiveBayesValidParams
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        NaiveBayesValidParams::fit(self, dataset, None)
    }
}

impl<'a, F, L, D, T> FitWith<'a, ArrayBase<D, Ix2>, T, NaiveBayesError>
    for ComplementNbValidParams<F, L>
where
    F: Float,
    L: Label + Ord + 'a,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = L> + Labels<Elem = L>,
{
    type ObjectIn = Option<ComplementNb<F, L>>;
    type ObjectOut = ComplementNb<F, L>;

    fn fit_with(
        &self,
        model_in: Self::ObjectIn,
        dataset: &'a DatasetBase<ArrayBase<D, Ix2>, T>,
    ) -> Result<Self::ObjectOut> {
        let x = dataset.records();
        let y = dataset.as_single_targets();
        let weights = chunk_weights(dataset)?;
        check_non_negative(x)?;

        let mut observed = dataset.labels();
        observed.sort_unstable();

        let mut model = match model_in {
            Some(model) => {
                check_nfeatures(model.feature_count.ncols(), x.nfeatures())?;
                check_frozen_registry(&model.registry, self.classes(), &observed)?;
                check_class_prior(model.registry.len(), self.class_prior())?;
                model
            }
            None => {
                if x.nsamples() == 0 {
                    return Err(savia::Error::NotEnoughSamples.into());
                }
                let registry = initial_registry(self.classes(), &observed)?;
                check_class_prior(registry.len(), self.class_prior())?;

                let (nclasses, nfeatures) = (registry.len(), x.nfeatures());
                ComplementNb {
                    registry,
                    class_count: Array1::zeros(nclasses),
                    feature_count: Array2::zeros((nclasses, nfeatures)),
                    feature_weights: Array2::zeros((nclasses, nfeatures)),
                    priors: Array1::zeros(nclasses),
                }
            }
        };

        // Validation is complete; merge the chunk into the running counts.
        for class in &observed {
            let position = model.registry.index_of(class)?;

            let (xclass, wclass) = filter(x.view(), y.view(), weights.view(), class);

            model.class_count[position] += wclass.sum();
            let weighted_counts = xclass.t().dot(&wclass);
            let mut row = model.feature_count.row_mut(position);
            row += &weighted_counts;
        }

        model.refresh_feature_weights(self.alpha());
        model.priors = estimate_priors(
            model.class_count.view(),
            self.fit_prior(),
            self.class_prior(),
        )?;

        Ok(model)
    }
}

impl<F: Float, L: Label, D> PredictInplace<ArrayBase<D, Ix2>, Array1<L>> for ComplementNb<F, L>
where
    D: Data<Elem = F>,
{
    // Thin wrapper around the corresponding method of NaiveBayes
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<L>) {
        NaiveBayes::predict_inplace(self, x, y);
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<L> {
        Array1::default(x.nrows())
    }
}

/// Fitted Complement Naive Bayes classifier.
///
/// See [ComplementNbParams] for more information on the hyperparameters.
///
/// # Decision rule
///
/// The per-class feature weights are estimated from the *complement* of
/// each class — the pooled counts of every other class — and renormalized
/// by their absolute sum. A sample's score against a class measures how
/// well it matches that class's complement, so the predicted class is the
/// **arg-min** of the scores, with ties broken toward the lowest class
/// index. `predict_proba` and `predict_log_proba` normalize the negated
/// scores, keeping their ranking consistent with `predict`.
///
/// The complement estimate pools `|classes| - 1` classes per weight, which
/// makes it considerably more stable than the Multinomial estimate on
/// imbalanced data.
///
/// # Model usage example
///
/// The example below creates a set of hyperparameters, and then uses it to
/// fit a Complement Naive Bayes classifier on provided data.
///
/// ```rust
/// use savia_bayes::{ComplementNbParams, ComplementNbValidParams, Result};
/// use savia::prelude::*;
/// use ndarray::array;
///
/// let x = array![
///     [4., 0., 1.],
///     [3., 1., 0.],
///     [0., 3., 1.],
///     [1., 4., 0.]
/// ];
/// let y = array![1usize, 1, 2, 2];
/// let ds = DatasetView::new(x.view(), y.view());
///
/// let model = ComplementNbParams::new().alpha(1.0).fit(&ds)?;
/// let pred = model.predict(&x);
///
/// assert_eq!(pred, y);
/// # Result::Ok(())
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct ComplementNb<F, L> {
    registry: ClassRegistry<L>,
    class_count: Array1<F>,
    feature_count: Array2<F>,
    feature_weights: Array2<F>,
    priors: Array1<F>,
}

impl<F: Float, L: Label> ComplementNb<F, L> {
    /// Construct a new set of hyperparameters
    pub fn params() -> ComplementNbParams<F, L> {
        ComplementNbParams::new()
    }

    /// Estimated or fixed class priors, in registry order
    pub fn priors(&self) -> ArrayView1<F> {
        self.priors.view()
    }

    /// Renormalized complement feature log-weights, in registry order
    pub fn feature_weights(&self) -> &Array2<F> {
        &self.feature_weights
    }

    /// Rebuild the complement weights from the raw counts
    ///
    /// For class `c` the smoothed feature distribution of its complement
    /// (all other classes pooled) is taken in log space and renormalized
    /// by the absolute weight sum per class.
    fn refresh_feature_weights(&mut self, alpha: F) {
        let nfeatures = self.feature_count.ncols();
        let total_per_feature = self.feature_count.sum_axis(Axis(0));
        let grand_total = total_per_feature.sum();

        for position in 0..self.registry.len() {
            let complement_counts = &total_per_feature - &self.feature_count.row(position);
            let complement_total = grand_total - self.feature_count.row(position).sum();

            let mut weights = complement_counts
                .mapv(|count| smoothed_log_ratio(count, complement_total, alpha, nfeatures));

            let norm = weights.iter().map(|w| w.abs()).sum::<F>();
            if norm > F::zero() {
                weights.mapv_inplace(|w| w / norm);
            }

            self.feature_weights.row_mut(position).assign(&weights);
        }
    }
}

impl<F, L> NaiveBayes<F, L> for ComplementNb<F, L>
where
    F: Float,
    L: Label,
{
    fn classes(&self) -> &[L] {
        self.registry.classes()
    }

    // Compute the per-class complement-match scores. Unlike the other
    // variants a *lower* score marks the more likely class.
    fn joint_log_likelihood(&self, x: ArrayView2<F>) -> Array2<F> {
        let scores = x.dot(&self.feature_weights.t());

        // with a single class the complement is empty and the prior is all
        // that is left to score with
        if self.registry.len() == 1 {
            return scores + &self.priors.mapv(|prior| prior.ln());
        }

        scores
    }

    // The sample is assigned to the class whose complement it matches
    // worst: the arg-min of the scores
    fn predict_inplace<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<L>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        let scores = self.joint_log_likelihood(x.view());

        *y = scores.map_axis(Axis(1), |row| self.classes()[row_argmin(row)].clone());
    }

    // Normalize the negated scores so that probability ranking agrees with
    // the arg-min decision rule
    fn predict_log_proba(&self, x: ArrayView2<F>) -> (Array2<F>, &[L]) {
        let scores = self.joint_log_likelihood(x);

        (log_normalize(scores.mapv(|score| -score)), self.classes())
    }
}

#[cfg(test)]
mod tests {
    use super::{ComplementNb, NaiveBayes, Result};
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Axis};
    use savia::traits::{Fit, FitWith, Predict};
    use savia::{Dataset, DatasetView, Error};

    #[test]
    fn argmin_orientation_on_mirrored_classes() -> Result<()> {
        // class 1 is the exact mirror of class 2's complement
        let ds = Dataset::new(array![[3., 0.], [0., 3.]], array![1usize, 2]);
        let model = ComplementNb::params().fit(&ds)?;

        // complement of class 1 holds only feature 1 counts, so feature 0
        // carries the strongly negative weight
        let weights = model.feature_weights();
        // ln(1/5) / (|ln(1/5)| + |ln(4/5)|) and ln(4/5) / (...)
        let expected = array![
            [-0.87823057, -0.12176943],
            [-0.12176943, -0.87823057]
        ];
        assert_abs_diff_eq!(weights, &expected, epsilon = 1e-6);

        let pred = model.predict(&array![[1., 0.], [0., 1.], [5., 1.]]);
        assert_eq!(pred, array![1usize, 2, 1]);

        Ok(())
    }

    #[test]
    fn probabilities_rank_like_predictions() -> Result<()> {
        let ds = Dataset::new(
            array![[4., 0., 1.], [3., 1., 0.], [0., 3., 1.], [1., 4., 0.]],
            array![1usize, 1, 2, 2],
        );

        let model = ComplementNb::params().fit(&ds)?;
        let pred = model.predict(ds.records());
        let (proba, classes) = model.predict_proba(ds.records().view());

        for (sample, label) in pred.iter().enumerate() {
            let row = proba.row(sample);
            let best = row
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .unwrap()
                .0;
            assert_eq!(&classes[best], label);
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-6);
        }

        Ok(())
    }

    #[test]
    fn incremental_equals_batch() -> Result<()> {
        let x = array![[4., 0., 1.], [3., 1., 0.], [0., 3., 1.], [1., 4., 0.]];
        let y = array![1usize, 1, 2, 2];

        let batch = ComplementNb::params().fit(&DatasetView::new(x.view(), y.view()))?;

        // the first chunk only carries class 1, so the full class set is
        // declared up front
        let clf = ComplementNb::params().classes(vec![1, 2]);
        let chunked = x
            .axis_chunks_iter(Axis(0), 2)
            .zip(y.axis_chunks_iter(Axis(0), 2))
            .map(|(a, b)| DatasetView::new(a, b))
            .try_fold(None, |current, d| clf.fit_with(current, &d).map(Some))?
            .ok_or(Error::NotEnoughSamples)?;

        assert_abs_diff_eq!(
            batch.feature_weights(),
            chunked.feature_weights(),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            batch.joint_log_likelihood(x.view()),
            chunked.joint_log_likelihood(x.view()),
            epsilon = 1e-12
        );

        Ok(())
    }

    #[test]
    fn sample_weights_respected() -> Result<()> {
        let x = array![[2., 0.], [0., 2.], [1., 1.]];
        let y = array![1usize, 2, 2];
        let weights = array![2.0f32, 1.0, 1.0];
        let weighted = ComplementNb::params()
            .fit(&DatasetView::new(x.view(), y.view()).with_weights(weights))?;

        let x_dup = array![[2., 0.], [2., 0.], [0., 2.], [1., 1.]];
        let y_dup = array![1usize, 1, 2, 2];
        let duplicated =
            ComplementNb::params().fit(&DatasetView::new(x_dup.view(), y_dup.view()))?;

        assert_abs_diff_eq!(
            weighted.feature_weights(),
            duplicated.feature_weights(),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(weighted.priors(), duplicated.priors(), epsilon = 1e-12);

        Ok(())
    }
}
