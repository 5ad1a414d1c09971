//! Shared prediction and estimation plumbing for Naive Bayes models
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Ix2};

use savia::dataset::{AsSingleTargets, DatasetBase, Labels, Records};
use savia::traits::FitWith;
use savia::{Float, Label};

use crate::error::{NaiveBayesError, Result};
use crate::registry::ClassRegistry;

/// Trait computing predictions for fitted Naive Bayes models
pub trait NaiveBayes<F, L>
where
    F: Float,
    L: Label,
{
    /// Class labels in registry order; the columns of
    /// [`joint_log_likelihood`](NaiveBayes::joint_log_likelihood) follow
    /// this order.
    fn classes(&self) -> &[L];

    /// Compute the unnormalized posterior log probabilities, one row per
    /// sample and one column per class.
    fn joint_log_likelihood(&self, x: ArrayView2<F>) -> Array2<F>;

    #[doc(hidden)]
    fn predict_inplace<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<L>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        let joint_log_likelihood = self.joint_log_likelihood(x.view());

        // Identify the class with the maximum log likelihood
        *y = joint_log_likelihood.map_axis(Axis(1), |scores| {
            self.classes()[row_argmax(scores)].clone()
        });
    }

    /// Compute log-probability estimates for each sample wrt classes.
    /// The columns correspond to classes in registry order, returned as the
    /// second output.
    fn predict_log_proba(&self, x: ArrayView2<F>) -> (Array2<F>, &[L]) {
        let joint_log_likelihood = self.joint_log_likelihood(x);

        (log_normalize(joint_log_likelihood), self.classes())
    }

    /// Compute probability estimates for each sample wrt classes.
    /// The columns correspond to classes in registry order, returned as the
    /// second output.
    fn predict_proba(&self, x: ArrayView2<F>) -> (Array2<F>, &[L]) {
        let (log_prob, classes) = self.predict_log_proba(x);

        (log_prob.mapv(|v| v.exp()), classes)
    }
}

/// Common functionality for hyperparameter sets of Naive Bayes models
/// ready for estimation
pub(crate) trait NaiveBayesValidParams<'a, F, L, D, T>:
    FitWith<'a, ArrayBase<D, Ix2>, T, NaiveBayesError>
where
    F: Float,
    L: Label + Ord,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = L> + Labels<Elem = L>,
{
    /// A batch fit is a single incremental fit over the whole dataset,
    /// starting from a fresh model
    fn fit(
        &self,
        dataset: &'a DatasetBase<ArrayBase<D, Ix2>, T>,
        model_none: Self::ObjectIn,
    ) -> Result<Self::ObjectOut> {
        self.fit_with(model_none, dataset)
    }
}

/// First index of the row maximum; ties collapse to the lowest class index
pub(crate) fn row_argmax<F: Float>(scores: ArrayView1<F>) -> usize {
    let mut best = 0;
    for (idx, &score) in scores.iter().enumerate() {
        if score > scores[best] {
            best = idx;
        }
    }
    best
}

/// First index of the row minimum; ties collapse to the lowest class index
pub(crate) fn row_argmin<F: Float>(scores: ArrayView1<F>) -> usize {
    let mut best = 0;
    for (idx, &score) in scores.iter().enumerate() {
        if score < scores[best] {
            best = idx;
        }
    }
    best
}

/// Subtract the row-wise log-sum-exp, leaving normalized log probabilities
///
/// The row maximum is subtracted before exponentiating so that large
/// magnitude scores cannot overflow.
pub(crate) fn log_normalize<F: Float>(mut scores: Array2<F>) -> Array2<F> {
    for mut row in scores.rows_mut() {
        let max = row
            .iter()
            .fold(F::neg_infinity(), |a, &b| if b > a { b } else { a });
        let log_sum_exp = max + row.iter().map(|&v| (v - max).exp()).sum::<F>().ln();
        row.mapv_inplace(|v| v - log_sum_exp);
    }
    scores
}

/// Per-sample weights as `F`, defaulting to one; validates that row, label
/// and weight counts agree and that no weight is negative
pub(crate) fn chunk_weights<F, D, T, L>(
    dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
) -> Result<Array1<F>>
where
    F: Float,
    D: Data<Elem = F>,
    L: Label,
    T: AsSingleTargets<Elem = L>,
{
    let nsamples = dataset.records().nsamples();
    let targets = dataset.as_single_targets();
    if targets.len() != nsamples {
        return Err(NaiveBayesError::ShapeMismatch(format!(
            "{} samples but {} labels",
            nsamples,
            targets.len()
        )));
    }

    match dataset.weights() {
        Some(weights) => {
            if weights.len() != nsamples {
                return Err(NaiveBayesError::ShapeMismatch(format!(
                    "{} samples but {} sample weights",
                    nsamples,
                    weights.len()
                )));
            }
            if let Some(negative) = weights.iter().find(|w| **w < 0.0) {
                return Err(NaiveBayesError::NegativeValue(format!(
                    "sample weight {}",
                    negative
                )));
            }
            Ok(weights.mapv(F::cast))
        }
        None => Ok(Array1::from_elem(nsamples, F::one())),
    }
}

/// Establish the registry from the first chunk: a declared class list
/// (caller order kept) or the sorted unique labels of the chunk. Every
/// observed label must be covered.
pub(crate) fn initial_registry<L: Label + Ord>(
    declared: Option<&Vec<L>>,
    observed: &[L],
) -> Result<ClassRegistry<L>> {
    let registry = match declared {
        Some(classes) => ClassRegistry::from_declared(classes)?,
        None => ClassRegistry::from_sorted_labels(observed),
    };
    check_labels(&registry, observed)?;
    Ok(registry)
}

/// A later chunk may re-declare the class list only when it is identical
/// to the frozen registry (the chunk-fold idiom reuses one parameter set);
/// any other list fails, as does any label outside the registry.
pub(crate) fn check_frozen_registry<L: Label>(
    registry: &ClassRegistry<L>,
    declared: Option<&Vec<L>>,
    observed: &[L],
) -> Result<()> {
    if let Some(classes) = declared {
        if registry.classes() != classes.as_slice() {
            return Err(NaiveBayesError::ClassesAlreadyFrozen);
        }
    }
    check_labels(registry, observed)
}

pub(crate) fn check_labels<L: Label>(registry: &ClassRegistry<L>, observed: &[L]) -> Result<()> {
    for label in observed {
        registry.index_of(label)?;
    }
    Ok(())
}

/// The feature count is fixed by the first chunk
pub(crate) fn check_nfeatures(expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(NaiveBayesError::ShapeMismatch(format!(
            "the chunk has {} features but the model was fitted with {}",
            found, expected
        )));
    }
    Ok(())
}

/// Count-like variants require non-negative feature values
pub(crate) fn check_non_negative<F, D>(x: &ArrayBase<D, Ix2>) -> Result<()>
where
    F: Float,
    D: Data<Elem = F>,
{
    match x.iter().find(|value| **value < F::zero()) {
        Some(value) => Err(NaiveBayesError::NegativeValue(format!(
            "feature value {}",
            value
        ))),
        None => Ok(()),
    }
}

/// A fixed prior vector must match the class count, contain no negative
/// entry and sum to one
pub(crate) fn check_class_prior<F: Float>(
    nclasses: usize,
    class_prior: Option<&Array1<F>>,
) -> Result<()> {
    if let Some(priors) = class_prior {
        if priors.len() != nclasses {
            return Err(NaiveBayesError::Priors(format!(
                "the number of priors ({}) does not match the number of classes ({})",
                priors.len(),
                nclasses
            )));
        }
        if (priors.sum() - F::one()).abs() > F::cast(1e-6) {
            return Err(NaiveBayesError::Priors(format!(
                "the sum of priors ({}) does not equal 1",
                priors.sum()
            )));
        }
        if priors.iter().any(|p| *p < F::zero()) {
            return Err(NaiveBayesError::Priors(
                "class priors cannot have negative values".to_string(),
            ));
        }
    }
    Ok(())
}

/// Class priors: relative class-weight frequencies, a uniform
/// distribution, or a validated fixed vector
pub(crate) fn estimate_priors<F: Float>(
    class_count: ArrayView1<F>,
    fit_prior: bool,
    class_prior: Option<&Array1<F>>,
) -> Result<Array1<F>> {
    check_class_prior(class_count.len(), class_prior)?;

    if let Some(priors) = class_prior {
        return Ok(priors.clone());
    }

    if fit_prior {
        let total = class_count.sum();
        Ok(class_count.mapv(|count| count / total))
    } else {
        let nclasses = class_count.len();
        Ok(Array1::from_elem(nclasses, F::one() / F::cast(nclasses)))
    }
}

#[cfg(test)]
mod tests {
    use super::{estimate_priors, log_normalize, row_argmax, row_argmin};
    use crate::NaiveBayesError;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Axis};

    #[test]
    fn argmax_breaks_ties_toward_lowest_index() {
        let scores = array![1.0f64, 3.0, 3.0, 2.0];
        assert_eq!(row_argmax(scores.view()), 1);

        let scores = array![5.0f64, 5.0];
        assert_eq!(row_argmax(scores.view()), 0);

        let scores = array![2.0f64, 2.0];
        assert_eq!(row_argmin(scores.view()), 0);
    }

    #[test]
    fn log_normalize_rows_sum_to_one() {
        let scores = array![[1000.0f64, 1001.0, 999.0], [-1000.0, -1000.5, -998.0]];
        let normalized = log_normalize(scores);
        for row_sum in normalized.mapv(f64::exp).sum_axis(Axis(1)).iter() {
            assert_abs_diff_eq!(*row_sum, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn priors_from_frequencies() {
        let priors = estimate_priors(array![3.0f64, 1.0].view(), true, None).unwrap();
        assert_abs_diff_eq!(priors, array![0.75, 0.25]);
    }

    #[test]
    fn uniform_priors() {
        let priors = estimate_priors(array![3.0f64, 1.0].view(), false, None).unwrap();
        assert_abs_diff_eq!(priors, array![0.5, 0.5]);
    }

    #[test]
    fn fixed_priors_validated() {
        let class_count = array![3.0f64, 1.0];
        let fixed = array![0.3, 0.7];
        let priors = estimate_priors(class_count.view(), true, Some(&fixed)).unwrap();
        assert_abs_diff_eq!(priors, fixed);

        let unnormalized = array![0.3, 0.3];
        match estimate_priors(class_count.view(), true, Some(&unnormalized)) {
            Err(NaiveBayesError::Priors(_)) => {}
            other => panic!("expected Priors error, got {:?}", other),
        }

        let wrong_len = array![1.0];
        assert!(estimate_priors(class_count.view(), true, Some(&wrong_len)).is_err());
    }
}
