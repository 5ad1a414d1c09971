use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Data, Ix2};

use savia::dataset::{AsSingleTargets, DatasetBase, Labels, Records};
use savia::traits::{Fit, FitWith, PredictInplace};
use savia::{Float, Label};

use crate::base_nb::{
    check_class_prior, check_frozen_registry, check_nfeatures, check_non_negative, chunk_weights,
    estimate_priors, initial_registry, NaiveBayes, NaiveBayesValidParams,
};
use crate::error::{NaiveBayesError, Result};
use crate::filter;
use crate::hyperparams::{MultinomialNbParams, MultinomialNbValidParams};
use crate::registry::ClassRegistry;
use crate::smoothing::smoothed_log_ratio;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

impl<'a, F, L, D, T> NaiveBayesValidParams<'a, F, L, D, T> for MultinomialNbValidParams<F, L>
where
    F: Float,
    L: Label + Ord + 'a,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = L> + Labels<Elem = L>,
{
}

impl<F, L, D, T> Fit<ArrayBase<D, Ix2>, T, NaiveBayesError> for MultinomialNbValidParams<F, L>
where
    F: Float,
    L: Label + Ord,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = L> + Labels<Elem = L>,
{
    type Object = MultinomialNb<F, L>;

    // Thin wrapper around the corresponding method of NaiveBayesValidParams
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        NaiveBayesValidParams::fit(self, dataset, None)
    }
}

impl<'a, F, L, D, T> FitWith<'a, ArrayBase<D, Ix2>, T, NaiveBayesError>
    for MultinomialNbValidParams<F, L>
where
    F: Float,
    L: Label + Ord + 'a,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = L> + Labels<Elem = L>,
{
    type ObjectIn = Option<MultinomialNb<F, L>>;
    type ObjectOut = MultinomialNb<F, L>;

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
                MultinomialNb {
                    registry,
                    class_count: Array1::zeros(nclasses),
                    feature_count: Array2::zeros((nclasses, nfeatures)),
                    feature_log_prob: Array2::zeros((nclasses, nfeatures)),
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

        model.refresh_feature_log_prob(self.alpha());
        model.priors = estimate_priors(
            model.class_count.view(),
            self.fit_prior(),
            self.class_prior(),
        )?;

        Ok(model)
    }
}

impl<F: Float, L: Label, D> PredictInplace<ArrayBase<D, Ix2>, Array1<L>> for MultinomialNb<F, L>
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

/// Fitted Multinomial Naive Bayes classifier.
///
/// See [MultinomialNbParams] for more information on the hyperparameters.
///
/// # Model assumptions
///
/// The family of Naive Bayes classifiers assume independence between
/// variables. They do not model moments between variables and lack
/// therefore in modelling capability. The advantage is a linear fitting
/// time with maximum-likelihood training in a closed form.
///
/// Feature values are interpreted as non-negative event counts or count
/// weights (e.g. weighted term frequencies); fractional values are
/// accepted.
///
/// # Model usage example
///
/// The example below creates a set of hyperparameters, and then uses it to
/// fit a Multinomial Naive Bayes classifier on provided data.
///
/// ```rust
/// use savia_bayes::{MultinomialNbParams, MultinomialNbValidParams, Result};
/// use savia::prelude::*;
/// use ndarray::array;
///
/// let x = array![
///     [1., 0.],
///     [2., 0.],
///     [3., 0.],
///     [0., 1.],
///     [0., 2.],
///     [0., 3.]
/// ];
/// let y = array![1usize, 1, 1, 2, 2, 2];
/// let ds = DatasetView::new(x.view(), y.view());
///
/// // create a new parameter set with smoothing parameter equals `1`
/// let unchecked_params = MultinomialNbParams::new()
///     .alpha(1.0);
///
/// // fit model with unchecked parameter set
/// let model = unchecked_params.fit(&ds)?;
///
/// // transform into a verified parameter set
/// let checked_params = unchecked_params.check()?;
///
/// // update model with the verified parameters, this only returns
/// // errors originating from the fitting process
/// let model = checked_params.fit_with(Some(model), &ds)?;
/// # let _ = model;
/// # Result::Ok(())
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct MultinomialNb<F, L> {
    registry: ClassRegistry<L>,
    class_count: Array1<F>,
    feature_count: Array2<F>,
    feature_log_prob: Array2<F>,
    priors: Array1<F>,
}

impl<F: Float, L: Label> MultinomialNb<F, L> {
    /// Construct a new set of hyperparameters
    pub fn params() -> MultinomialNbParams<F, L> {
        MultinomialNbParams::new()
    }

    /// Estimated or fixed class priors, in registry order
    pub fn priors(&self) -> ArrayView1<F> {
        self.priors.view()
    }

    /// Per-class smoothed feature log-probabilities, in registry order
    pub fn feature_log_prob(&self) -> &Array2<F> {
        &self.feature_log_prob
    }

    /// Rebuild the smoothed feature log-probabilities from the raw counts
    fn refresh_feature_log_prob(&mut self, alpha: F) {
        let nfeatures = self.feature_count.ncols();
        for (position, counts) in self.feature_count.rows().into_iter().enumerate() {
            let total = counts.sum();
            let log_prob = counts.mapv(|count| smoothed_log_ratio(count, total, alpha, nfeatures));
            self.feature_log_prob.row_mut(position).assign(&log_prob);
        }
    }
}

impl<F, L> NaiveBayes<F, L> for MultinomialNb<F, L>
where
    F: Float,
    L: Label,
{
    fn classes(&self) -> &[L] {
        self.registry.classes()
    }

    // Compute unnormalized posterior log probability
    fn joint_log_likelihood(&self, x: ArrayView2<F>) -> Array2<F> {
        // Combine feature log probabilities and class priors to get the
        // log-likelihood for each class
        let jll = x.dot(&self.feature_log_prob.t());
        jll + &self.priors.mapv(|prior| prior.ln())
    }
}

#[cfg(test)]
mod tests {
    use super::{MultinomialNb, NaiveBayes, Result};
    use crate::NaiveBayesError;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Axis};
    use savia::traits::{Fit, FitWith, Predict};
    use savia::{Dataset, DatasetView, Error};

    #[test]
    fn test_multinomial_nb() -> Result<()> {
        let ds = Dataset::new(
            array![[1., 0.], [2., 0.], [3., 0.], [0., 1.], [0., 2.], [0., 3.]],
            array![1usize, 1, 1, 2, 2, 2],
        );

        let fitted_clf = MultinomialNb::params().fit(&ds)?;
        let pred = fitted_clf.predict(ds.records());

        assert_eq!(&pred, ds.targets());

        let jll = fitted_clf.joint_log_likelihood(ds.records().view());
        // Computed with sklearn.naive_bayes.MultinomialNB
        let expected = array![
            [-0.82667857, -2.77258872],
            [-0.96020997, -4.85203026],
            [-1.09374136, -6.93147181],
            [-2.77258872, -0.82667857],
            [-4.85203026, -0.96020997],
            [-6.93147181, -1.09374136]
        ];
        assert_abs_diff_eq!(jll, expected, epsilon = 1e-6);

        let (proba, classes) = fitted_clf.predict_proba(ds.records().view());
        assert_eq!(classes, &[1usize, 2]);
        for row_sum in proba.sum_axis(Axis(1)).iter() {
            assert_abs_diff_eq!(*row_sum, 1.0, epsilon = 1e-6);
        }

        Ok(())
    }

    #[test]
    fn test_mnb_fit_with() -> Result<()> {
        let x = array![[1., 0.], [2., 0.], [3., 0.], [0., 1.], [0., 2.], [0., 3.]];
        let y = array![1usize, 1, 1, 2, 2, 2];

        // the first chunk only carries class 1, so the full class set is
        // declared up front
        let clf = MultinomialNb::params().classes(vec![1, 2]);

        let model = x
            .axis_chunks_iter(Axis(0), 2)
            .zip(y.axis_chunks_iter(Axis(0), 2))
            .map(|(a, b)| DatasetView::new(a, b))
            .try_fold(None, |current, d| clf.fit_with(current, &d).map(Some))?
            .ok_or(Error::NotEnoughSamples)?;

        let pred = model.predict(&x);

        assert_eq!(pred, y);

        let jll = model.joint_log_likelihood(x.view());
        // Computed with sklearn.naive_bayes.MultinomialNB
        let expected = array![
            [-0.82667857, -2.77258872],
            [-0.96020997, -4.85203026],
            [-1.09374136, -6.93147181],
            [-2.77258872, -0.82667857],
            [-4.85203026, -0.96020997],
            [-6.93147181, -1.09374136]
        ];
        assert_abs_diff_eq!(jll, expected, epsilon = 1e-6);

        Ok(())
    }

    #[test]
    fn smoothed_probabilities_sum_to_one_per_class() -> Result<()> {
        let ds = Dataset::new(
            array![[3., 0., 1.], [1., 2., 0.], [0., 4., 2.]],
            array![0usize, 1, 1],
        );
        let model = MultinomialNb::params().alpha(0.5).fit(&ds)?;

        for row in model.feature_log_prob().rows() {
            let total: f64 = row.mapv(f64::exp).sum();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
        }

        Ok(())
    }

    #[test]
    fn prior_recovery_matches_relative_frequencies() -> Result<()> {
        let x = array![[1., 0.], [2., 1.], [0., 1.], [3., 1.]];
        let y = array![0usize, 0, 0, 1];

        let model = MultinomialNb::params().fit(&DatasetView::new(x.view(), y.view()))?;
        let expected_priors = array![0.75, 0.25];
        assert_abs_diff_eq!(model.priors(), expected_priors.view());

        let uniform = MultinomialNb::params()
            .fit_prior(false)
            .fit(&DatasetView::new(x.view(), y.view()))?;
        let expected_uniform_priors = array![0.5, 0.5];
        assert_abs_diff_eq!(uniform.priors(), expected_uniform_priors.view());

        Ok(())
    }

    #[test]
    fn sample_weights_equal_row_duplication() -> Result<()> {
        let x = array![[1., 0.], [0., 2.], [2., 1.]];
        let y = array![0usize, 1, 1];
        let weights = array![3.0f32, 1.0, 2.0];
        let weighted = MultinomialNb::params()
            .fit(&DatasetView::new(x.view(), y.view()).with_weights(weights))?;

        let x_dup = array![[1., 0.], [1., 0.], [1., 0.], [0., 2.], [2., 1.], [2., 1.]];
        let y_dup = array![0usize, 0, 0, 1, 1, 1];
        let duplicated =
            MultinomialNb::params().fit(&DatasetView::new(x_dup.view(), y_dup.view()))?;

        assert_abs_diff_eq!(weighted.priors(), duplicated.priors(), epsilon = 1e-12);
        assert_abs_diff_eq!(
            weighted.feature_log_prob(),
            duplicated.feature_log_prob(),
            epsilon = 1e-12
        );

        Ok(())
    }

    #[test]
    fn negative_counts_rejected() {
        let ds = Dataset::new(array![[1., -2.], [0., 1.]], array![0usize, 1]);
        match MultinomialNb::params().fit(&ds) {
            Err(NaiveBayesError::NegativeValue(_)) => {}
            other => panic!("expected NegativeValue, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn ties_break_toward_the_lowest_class_index() -> Result<()> {
        // both classes see identical data, so every score ties
        let ds = Dataset::new(array![[1., 1.], [1., 1.]], array![0usize, 1]);
        let model = MultinomialNb::params().fit(&ds)?;

        let pred = model.predict(&array![[1., 1.], [5., 3.]]);
        assert_eq!(pred, array![0usize, 0]);

        Ok(())
    }

    #[test]
    fn failed_chunk_does_not_corrupt_statistics() -> Result<()> {
        let x = array![[1., 0.], [0., 1.]];
        let y = array![1usize, 2];
        let clf = MultinomialNb::params();
        let model = clf.fit_with(None, &DatasetView::new(x.view(), y.view()))?;

        // the bad label sits in the last row; validation runs before any merge
        let x2 = array![[5., 5.], [1., 2.]];
        let y2 = array![1usize, 3];
        let attempt = clf.fit_with(
            Some(model.clone()),
            &DatasetView::new(x2.view(), y2.view()),
        );
        match attempt {
            Err(NaiveBayesError::UnknownLabel(_)) => {}
            other => panic!("expected UnknownLabel, got {:?}", other.map(|_| ())),
        }

        // the surviving model is indistinguishable from a fresh fit
        let fresh = clf.fit_with(None, &DatasetView::new(x.view(), y.view()))?;
        assert_abs_diff_eq!(
            model.joint_log_likelihood(x.view()),
            fresh.joint_log_likelihood(x.view()),
            epsilon = 1e-12
        );

        Ok(())
    }
}
