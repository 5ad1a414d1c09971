use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Data, Ix2};

use savia::dataset::{AsSingleTargets, DatasetBase, Labels, Records};
use savia::traits::{Fit, FitWith, PredictInplace};
use savia::{Float, Label};

use crate::base_nb::{
    check_class_prior, check_frozen_registry, check_nfeatures, chunk_weights, estimate_priors,
    initial_registry, NaiveBayes, NaiveBayesValidParams,
};
use crate::error::{NaiveBayesError, Result};
use crate::hyperparams::{CategoricalNbParams, CategoricalNbValidParams};
use crate::registry::ClassRegistry;
use crate::smoothing::smoothed_log_ratio;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

impl<'a, F, L, D, T> NaiveBayesValidParams<'a, F, L, D, T> for CategoricalNbValidParams<F, L>
where
    F: Float,
    L: Label + Ord + 'a,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = L> + Labels<Elem = L>,
{
}

impl<F, L, D, T> Fit<ArrayBase<D, Ix2>, T, NaiveBayesError> for CategoricalNbValidParams<F, L>
where
    F: Float,
    L: Label + Ord,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = L> + Labels<Elem = L>,
{
    type Object = CategoricalNb<F, L>;

    // Thin wrapper around the corresponding method of NaiveBayesValidParams
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        NaiveBayesValidParams::fit(self, dataset, None)
    }
}

impl<'a, F, L, D, T> FitWith<'a, ArrayBase<D, Ix2>, T, NaiveBayesError>
    for CategoricalNbValidParams<F, L>
where
    F: Float,
    L: Label + Ord + 'a,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = L> + Labels<Elem = L>,
{
    type ObjectIn = Option<CategoricalNb<F, L>>;
    type ObjectOut = CategoricalNb<F, L>;

    fn fit_with(
        &self,
        model_in: Self::ObjectIn,
        dataset: &'a DatasetBase<ArrayBase<D, Ix2>, T>,
    ) -> Result<Self::ObjectOut> {
        let x = dataset.records();
        let y = dataset.as_single_targets();
        let weights = chunk_weights(dataset)?;
        let codes = encode(x.view())?;

        let mut observed = dataset.labels();
        observed.sort_unstable();

        let mut model = match model_in {
            Some(model) => {
                check_nfeatures(model.n_categories.len(), x.nfeatures())?;
                check_frozen_registry(&model.registry, self.classes(), &observed)?;
                check_class_prior(model.registry.len(), self.class_prior())?;
                // cardinalities are frozen with the first chunk; a code at
                // or beyond them rejects the whole chunk
                check_codes(&codes, &model.n_categories)?;
                model
            }
            None => {
                if x.nsamples() == 0 {
                    return Err(savia::Error::NotEnoughSamples.into());
                }
                let registry = initial_registry(self.classes(), &observed)?;
                check_class_prior(registry.len(), self.class_prior())?;

                let n_categories = resolve_cardinalities(
                    &codes,
                    x.nfeatures(),
                    self.min_categories(),
                    self.n_categories(),
                )?;
                // declared cardinalities must already cover the first chunk
                check_codes(&codes, &n_categories)?;

                let nclasses = registry.len();
                let category_count = n_categories
                    .iter()
                    .map(|&cardinality| Array2::zeros((nclasses, cardinality)))
                    .collect::<Vec<_>>();
                let feature_log_prob = n_categories
                    .iter()
                    .map(|&cardinality| Array2::zeros((nclasses, cardinality)))
                    .collect::<Vec<_>>();

                CategoricalNb {
                    registry,
                    class_count: Array1::zeros(nclasses),
                    n_categories,
                    category_count,
                    feature_log_prob,
                    priors: Array1::zeros(nclasses),
                }
            }
        };

        // Validation is complete; merge the chunk into the running counts.
        for ((row, label), &weight) in codes.rows().into_iter().zip(y.iter()).zip(weights.iter()) {
            if weight == F::zero() {
                continue;
            }
            let position = model.registry.index_of(label)?;

            model.class_count[position] += weight;
            for (feature, &code) in row.iter().enumerate() {
                model.category_count[feature][[position, code]] += weight;
            }
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

impl<F: Float, L: Label, D> PredictInplace<ArrayBase<D, Ix2>, Array1<L>> for CategoricalNb<F, L>
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

/// Integer category codes of a record matrix
///
/// Values must be non-negative; fractional values are truncated toward
/// zero, as the data contract calls for small integer codes.
fn encode<F: Float>(x: ArrayView2<F>) -> Result<Array2<usize>> {
    let mut codes = Array2::zeros(x.raw_dim());
    for ((row, col), value) in x.indexed_iter() {
        if *value < F::zero() {
            return Err(NaiveBayesError::NegativeValue(format!(
                "feature value {} of feature {}",
                value, col
            )));
        }
        codes[[row, col]] = value.to_usize().ok_or_else(|| {
            NaiveBayesError::NegativeValue(format!("feature value {} of feature {}", value, col))
        })?;
    }
    Ok(codes)
}

/// Every code must lie below its feature's cardinality
fn check_codes(codes: &Array2<usize>, n_categories: &[usize]) -> Result<()> {
    for (feature, &cardinality) in n_categories.iter().enumerate() {
        for &code in codes.column(feature).iter() {
            if code >= cardinality {
                return Err(NaiveBayesError::CategoryOutOfRange {
                    feature,
                    category: code,
                    cardinality,
                });
            }
        }
    }
    Ok(())
}

/// Category cardinalities of the first chunk: the declared values, or the
/// largest observed code plus one, raised to `min_categories`
fn resolve_cardinalities(
    codes: &Array2<usize>,
    nfeatures: usize,
    min_categories: Option<usize>,
    declared: Option<&Vec<usize>>,
) -> Result<Vec<usize>> {
    if let Some(declared) = declared {
        if declared.len() != nfeatures {
            return Err(NaiveBayesError::ShapeMismatch(format!(
                "{} declared category cardinalities for {} features",
                declared.len(),
                nfeatures
            )));
        }
        return Ok(declared.clone());
    }

    let floor = min_categories.unwrap_or(1);
    let mut cardinalities = vec![floor; nfeatures];
    for (feature, cardinality) in cardinalities.iter_mut().enumerate() {
        for &code in codes.column(feature).iter() {
            if code + 1 > *cardinality {
                *cardinality = code + 1;
            }
        }
    }
    Ok(cardinalities)
}

/// Fitted Categorical Naive Bayes classifier.
///
/// See [CategoricalNbParams] for more information on the hyperparameters.
///
/// # Data contract
///
/// Every feature holds small non-negative integer codes, each bounded by
/// the feature's category cardinality. The cardinalities are fixed by the
/// first fit call — the largest observed code plus one, optionally raised
/// to `min_categories`, or declared outright through `n_categories` — and
/// are immutable afterwards. A later chunk containing an out-of-range code
/// is rejected as a whole with `CategoryOutOfRange` before any statistic
/// is touched; prediction panics on out-of-range codes, like any other
/// shape violation of the prediction input.
///
/// # Model usage example
///
/// The example below fits the classifier on a tiny categorical dataset;
/// with Laplace smoothing the estimate for category `0` of feature `0`
/// under class `0` is `(2 + 1) / (2 + 2) = 0.75`.
///
/// ```rust
/// use savia_bayes::{CategoricalNbParams, Result};
/// use savia::prelude::*;
/// use ndarray::array;
///
/// let x = array![[0., 1.], [1., 0.], [0., 0.], [1., 1.]];
/// let y = array![0usize, 1, 0, 1];
/// let ds = DatasetView::new(x.view(), y.view());
///
/// let model = CategoricalNbParams::new().alpha(1.0).fit(&ds)?;
/// let pred = model.predict(&array![[0., 1.]]);
///
/// assert_eq!(pred, array![0usize]);
/// # Result::Ok(())
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalNb<F, L> {
    registry: ClassRegistry<L>,
    class_count: Array1<F>,
    n_categories: Vec<usize>,
    category_count: Vec<Array2<F>>,
    feature_log_prob: Vec<Array2<F>>,
    priors: Array1<F>,
}

impl<F: Float, L: Label> CategoricalNb<F, L> {
    /// Construct a new set of hyperparameters
    pub fn params() -> CategoricalNbParams<F, L> {
        CategoricalNbParams::new()
    }

    /// Estimated or fixed class priors, in registry order
    pub fn priors(&self) -> ArrayView1<F> {
        self.priors.view()
    }

    /// The fixed per-feature category cardinalities
    pub fn n_categories(&self) -> &[usize] {
        &self.n_categories
    }

    /// Per-feature tables of smoothed category log-probabilities, one
    /// `(nclasses, n_i)` table per feature, rows in registry order
    pub fn feature_log_prob(&self) -> &[Array2<F>] {
        &self.feature_log_prob
    }

    /// Rebuild the smoothed category log-probabilities from the raw counts
    fn refresh_feature_log_prob(&mut self, alpha: F) {
        for (feature, counts) in self.category_count.iter().enumerate() {
            let cardinality = self.n_categories[feature];
            let mut log_prob = Array2::zeros(counts.dim());
            for (position, row) in counts.rows().into_iter().enumerate() {
                let class_total = self.class_count[position];
                let smoothed =
                    row.mapv(|count| smoothed_log_ratio(count, class_total, alpha, cardinality));
                log_prob.row_mut(position).assign(&smoothed);
            }
            self.feature_log_prob[feature] = log_prob;
        }
    }
}

impl<F, L> NaiveBayes<F, L> for CategoricalNb<F, L>
where
    F: Float,
    L: Label,
{
    fn classes(&self) -> &[L] {
        self.registry.classes()
    }

    // Compute unnormalized posterior log probability. Only the observed
    // category of each feature contributes, via a table lookup.
    fn joint_log_likelihood(&self, x: ArrayView2<F>) -> Array2<F> {
        let nclasses = self.registry.len();
        let log_prior = self.priors.mapv(|prior| prior.ln());
        let mut joint_log_likelihood = Array2::zeros((x.nrows(), nclasses));

        for (sample, row) in x.rows().into_iter().enumerate() {
            for position in 0..nclasses {
                joint_log_likelihood[[sample, position]] = log_prior[position];
            }
            for (feature, value) in row.iter().enumerate() {
                let cardinality = self.n_categories[feature];
                let code = value
                    .to_usize()
                    .filter(|&code| code < cardinality)
                    .unwrap_or_else(|| {
                        panic!(
                            "category {} of feature {} exceeds the cardinality {}",
                            value, feature, cardinality
                        )
                    });
                let table = &self.feature_log_prob[feature];
                for position in 0..nclasses {
                    joint_log_likelihood[[sample, position]] += table[[position, code]];
                }
            }
        }

        joint_log_likelihood
    }
}

#[cfg(test)]
mod tests {
    use super::{CategoricalNb, NaiveBayes, Result};
    use crate::NaiveBayesError;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Axis};
    use savia::traits::{Fit, FitWith, Predict};
    use savia::{Dataset, DatasetView, Error};

    #[test]
    fn laplace_estimates_and_prediction() -> Result<()> {
        let x = array![[0., 1.], [1., 0.], [0., 0.], [1., 1.]];
        let y = array![0usize, 1, 0, 1];
        let ds = Dataset::new(x.clone(), y.clone());

        let model = CategoricalNb::params().fit(&ds)?;

        assert_eq!(model.n_categories(), &[2, 2]);

        // class 0 observed category 0 of feature 0 twice in two samples:
        // theta = (2 + 1) / (2 + 2) = 0.75
        let table = &model.feature_log_prob()[0];
        assert_abs_diff_eq!(table[[0, 0]], 0.75f64.ln(), epsilon = 1e-12);
        assert_abs_diff_eq!(table[[0, 1]], 0.25f64.ln(), epsilon = 1e-12);
        assert_abs_diff_eq!(table[[1, 0]], 0.25f64.ln(), epsilon = 1e-12);

        let pred = model.predict(&array![[0., 1.]]);
        assert_eq!(pred, array![0usize]);

        let (proba, classes) = model.predict_proba(array![[0., 1.], [1., 0.]].view());
        assert_eq!(classes, &[0usize, 1]);
        for row_sum in proba.sum_axis(Axis(1)).iter() {
            assert_abs_diff_eq!(*row_sum, 1.0, epsilon = 1e-6);
        }
        assert!(proba[[0, 0]] > proba[[0, 1]]);

        Ok(())
    }

    #[test]
    fn category_probabilities_sum_to_one() -> Result<()> {
        let x = array![[0., 2.], [1., 0.], [2., 1.], [0., 2.], [1., 1.]];
        let y = array![0usize, 0, 1, 1, 1];
        let model = CategoricalNb::params()
            .alpha(0.5)
            .fit(&Dataset::new(x, y))?;

        for table in model.feature_log_prob() {
            for row in table.rows() {
                let total: f64 = row.mapv(f64::exp).sum();
                assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
            }
        }

        Ok(())
    }

    #[test]
    fn incremental_equals_batch() -> Result<()> {
        let x = array![[0., 2.], [1., 0.], [2., 1.], [0., 2.], [1., 1.], [2., 0.]];
        let y = array![0usize, 0, 1, 1, 2, 2];

        let batch = CategoricalNb::params().fit(&DatasetView::new(x.view(), y.view()))?;

        // cardinalities are declared so that early chunks missing the top
        // codes cannot shrink the tables
        let clf = CategoricalNb::params()
            .classes(vec![0, 1, 2])
            .n_categories(vec![3, 3]);
        let chunked = x
            .axis_chunks_iter(Axis(0), 2)
            .zip(y.axis_chunks_iter(Axis(0), 2))
            .map(|(a, b)| DatasetView::new(a, b))
            .try_fold(None, |current, d| clf.fit_with(current, &d).map(Some))?
            .ok_or(Error::NotEnoughSamples)?;

        assert_eq!(batch.n_categories(), chunked.n_categories());
        assert_abs_diff_eq!(
            batch.joint_log_likelihood(x.view()),
            chunked.joint_log_likelihood(x.view()),
            epsilon = 1e-12
        );

        Ok(())
    }

    #[test]
    fn out_of_range_code_rejects_the_chunk() -> Result<()> {
        let x = array![[0., 1.], [1., 0.]];
        let y = array![0usize, 1];
        let clf = CategoricalNb::params();
        let model = clf.fit_with(None, &DatasetView::new(x.view(), y.view()))?;

        assert_eq!(model.n_categories(), &[2, 2]);

        // category 2 was never declared for feature 1
        let x2 = array![[0., 2.]];
        let y2 = array![0usize];
        match clf.fit_with(
            Some(model.clone()),
            &DatasetView::new(x2.view(), y2.view()),
        ) {
            Err(NaiveBayesError::CategoryOutOfRange {
                feature: 1,
                category: 2,
                cardinality: 2,
            }) => {}
            other => panic!("expected CategoryOutOfRange, got {:?}", other.map(|_| ())),
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

    #[test]
    fn min_categories_raises_cardinalities() -> Result<()> {
        let x = array![[0., 1.], [1., 0.]];
        let y = array![0usize, 1];
        let clf = CategoricalNb::params().min_categories(3);
        let model = clf.fit_with(None, &DatasetView::new(x.view(), y.view()))?;

        assert_eq!(model.n_categories(), &[3, 3]);

        // code 2 now fits into the reserved headroom
        let x2 = array![[2., 2.]];
        let y2 = array![0usize];
        let model = clf.fit_with(
            Some(model),
            &DatasetView::new(x2.view(), y2.view()),
        )?;
        assert_eq!(model.n_categories(), &[3, 3]);

        Ok(())
    }

    #[test]
    fn declared_cardinalities_must_cover_the_first_chunk() {
        let x = array![[0., 5.], [1., 0.]];
        let y = array![0usize, 1];
        let clf = CategoricalNb::params().n_categories(vec![2, 3]);
        match clf.fit_with(None, &DatasetView::new(x.view(), y.view())) {
            Err(NaiveBayesError::CategoryOutOfRange {
                feature: 1,
                category: 5,
                cardinality: 3,
            }) => {}
            other => panic!("expected CategoryOutOfRange, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn negative_codes_rejected() {
        let x = array![[0., -1.], [1., 0.]];
        let y = array![0usize, 1];
        match CategoricalNb::params().fit(&Dataset::new(x, y)) {
            Err(NaiveBayesError::NegativeValue(_)) => {}
            other => panic!("expected NegativeValue, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn sample_weights_equal_row_duplication() -> Result<()> {
        let x = array![[0., 1.], [1., 0.], [1., 1.]];
        let y = array![0usize, 1, 1];
        let weights = array![2.0f32, 1.0, 2.0];
        let weighted = CategoricalNb::params()
            .fit(&DatasetView::new(x.view(), y.view()).with_weights(weights))?;

        let x_dup = array![[0., 1.], [0., 1.], [1., 0.], [1., 1.], [1., 1.]];
        let y_dup = array![0usize, 0, 1, 1, 1];
        let duplicated =
            CategoricalNb::params().fit(&DatasetView::new(x_dup.view(), y_dup.view()))?;

        assert_abs_diff_eq!(weighted.priors(), duplicated.priors(), epsilon = 1e-12);
        assert_abs_diff_eq!(
            weighted.joint_log_likelihood(x.view()),
            duplicated.joint_log_likelihood(x.view()),
            epsilon = 1e-12
        );

        Ok(())
    }
}
