use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Ix2};
use ndarray_stats::QuantileExt;

use savia::dataset::{AsSingleTargets, DatasetBase, Labels, Records};
use savia::traits::{Fit, FitWith, PredictInplace};
use savia::{Float, Label};

use crate::base_nb::{
    check_class_prior, check_frozen_registry, check_nfeatures, chunk_weights, estimate_priors,
    initial_registry, NaiveBayes, NaiveBayesValidParams,
};
use crate::error::{NaiveBayesError, Result};
use crate::filter;
use crate::hyperparams::{GaussianNbParams, GaussianNbValidParams};
use crate::registry::ClassRegistry;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

impl<'a, F, L, D, T> NaiveBayesValidParams<'a, F, L, D, T> for GaussianNbValidParams<F, L>
where
    F: Float,
    L: Label + Ord + 'a,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = L> + Labels<Elem = L>,
{
}

impl<F, L, D, T> Fit<ArrayBase<D, Ix2>, T, NaiveBayesError> for GaussianNbValidParams<F, L>
where
    F: Float,
    L: Label + Ord,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = L> + Labels<Elem = L>,
{
    type Object = GaussianNb<F, L>;

    // Thin wrapper around the corresponding method of NaiveBayesValidParams
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        NaiveBayesValidParams::fit(self, dataset, None)
    }
}

impl<'a, F, L, D, T> FitWith<'a, ArrayBase<D, Ix2>, T, NaiveBayesError>
    for GaussianNbValidParams<F, L>
where
    F: Float,
    L: Label + Ord + 'a,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = L> + Labels<Elem = L>,
{
    type ObjectIn = Option<GaussianNb<F, L>>;
    type ObjectOut = GaussianNb<F, L>;

    fn fit_with(
        &self,
        model_in: Self::ObjectIn,
        dataset: &'a DatasetBase<ArrayBase<D, Ix2>, T>,
    ) -> Result<Self::ObjectOut> {
        let x = dataset.records();
        let y = dataset.as_single_targets();
        let weights = chunk_weights(dataset)?;

        let mut observed = dataset.labels();
        observed.sort_unstable();

        let mut model = match model_in {
            Some(model) => {
                check_nfeatures(model.theta.ncols(), x.nfeatures())?;
                check_frozen_registry(&model.registry, self.classes(), &observed)?;
                check_class_prior(model.registry.len(), self.priors())?;
                model
            }
            None => {
                if x.nsamples() == 0 {
                    return Err(savia::Error::NotEnoughSamples.into());
                }
                if x.nfeatures() == 0 {
                    return Err(NaiveBayesError::ShapeMismatch(
                        "at least one feature is required".to_string(),
                    ));
                }
                let registry = initial_registry(self.classes(), &observed)?;
                check_class_prior(registry.len(), self.priors())?;

                let (nclasses, nfeatures) = (registry.len(), x.nfeatures());
                GaussianNb {
                    registry,
                    class_count: Array1::zeros(nclasses),
                    theta: Array2::zeros((nclasses, nfeatures)),
                    m2: Array2::zeros((nclasses, nfeatures)),
                    priors: Array1::zeros(nclasses),
                    epsilon: F::zero(),
                }
            }
        };

        // Validation is complete; merge the chunk into the running moments.
        for class in &observed {
            let position = model.registry.index_of(class)?;

            let (xclass, wclass) = filter(x.view(), y.view(), weights.view(), class);
            let (count, mean, m2) = Self::chunk_moments(xclass.view(), wclass.view());

            model.merge_class_moments(position, count, &mean, &m2);
        }

        model.refresh_epsilon(self.var_smoothing())?;
        model.priors = estimate_priors(model.class_count.view(), true, self.priors())?;

        Ok(model)
    }
}

impl<F: Float, L: Label, D> PredictInplace<ArrayBase<D, Ix2>, Array1<L>> for GaussianNb<F, L>
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

impl<F, L> GaussianNbValidParams<F, L>
where
    F: Float,
{
    /// Weighted Welford pass over one class's chunk rows, producing one
    /// `(count, mean, M2)` triple per feature. The running-mean form keeps
    /// the accumulated floating error independent of the chunk length.
    fn chunk_moments(x: ArrayView2<F>, weights: ArrayView1<F>) -> (F, Array1<F>, Array1<F>) {
        let mut count = F::zero();
        let mut mean = Array1::<F>::zeros(x.ncols());
        let mut m2 = Array1::<F>::zeros(x.ncols());

        for (row, &weight) in x.rows().into_iter().zip(weights.iter()) {
            if weight == F::zero() {
                continue;
            }
            count += weight;
            let delta = &row - &mean;
            mean = mean + delta.mapv(|d| d * (weight / count));
            let delta_after = &row - &mean;
            m2 = m2 + (delta * delta_after).mapv(|d| d * weight);
        }

        (count, mean, m2)
    }
}

/// Fitted Gaussian Naive Bayes classifier.
///
/// See [GaussianNbParams] for more information on the hyperparameters.
///
/// # Model assumptions
///
/// The family of Naive Bayes classifiers assume independence between
/// variables. They do not model moments between variables and lack
/// therefore in modelling capability. The advantage is a linear fitting
/// time with maximum-likelihood training in a closed form.
///
/// # Sufficient statistics
///
/// Per class and feature the model maintains the weighted observation
/// count, the running mean and the summed squared deviations from it.
/// Chunks merge through the parallel-variance combination of those
/// triples, so fitting the chunks of a dataset in any order yields the
/// same statistics as a single pass. The per-class variance is floored by
/// a configurable fraction of the largest pooled feature variance to
/// avoid zero-variance singularities.
///
/// # Model usage example
///
/// The example below creates a set of hyperparameters, and then uses it to
/// fit a Gaussian Naive Bayes classifier on provided data.
///
/// ```rust
/// use savia_bayes::{GaussianNbParams, GaussianNbValidParams, Result};
/// use savia::prelude::*;
/// use ndarray::array;
///
/// let x = array![
///     [-2., -1.],
///     [-1., -1.],
///     [-1., -2.],
///     [1., 1.],
///     [1., 2.],
///     [2., 1.]
/// ];
/// let y = array![1usize, 1, 1, 2, 2, 2];
/// let ds = DatasetView::new(x.view(), y.view());
///
/// // create a new parameter set with variance smoothing equals `1e-5`
/// let unchecked_params = GaussianNbParams::new()
///     .var_smoothing(1e-5);
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
pub struct GaussianNb<F, L> {
    registry: ClassRegistry<L>,
    class_count: Array1<F>,
    theta: Array2<F>,
    m2: Array2<F>,
    priors: Array1<F>,
    epsilon: F,
}

impl<F: Float, L: Label> GaussianNb<F, L> {
    /// Construct a new set of hyperparameters
    pub fn params() -> GaussianNbParams<F, L> {
        GaussianNbParams::new()
    }

    /// Estimated or fixed class priors, in registry order
    pub fn priors(&self) -> ArrayView1<F> {
        self.priors.view()
    }

    /// Per-class feature means, in registry order
    pub fn theta(&self) -> &Array2<F> {
        &self.theta
    }

    /// Per-class feature variances with the variance floor applied
    pub fn variance(&self) -> Array2<F> {
        let mut variance = Array2::from_elem(self.m2.dim(), self.epsilon);
        for (position, &count) in self.class_count.iter().enumerate() {
            if count == F::zero() {
                continue;
            }
            for (feature, floored) in variance.row_mut(position).iter_mut().enumerate() {
                let estimate = self.m2[[position, feature]] / count;
                if estimate > *floored {
                    *floored = estimate;
                }
            }
        }
        variance
    }

    /// Parallel combination of the stored moments of one class with a
    /// chunk aggregate
    fn merge_class_moments(
        &mut self,
        position: usize,
        count_new: F,
        mean_new: &Array1<F>,
        m2_new: &Array1<F>,
    ) {
        if count_new == F::zero() {
            return;
        }

        let count_old = self.class_count[position];
        if count_old == F::zero() {
            self.class_count[position] = count_new;
            self.theta.row_mut(position).assign(mean_new);
            self.m2.row_mut(position).assign(m2_new);
            return;
        }

        let count = count_old + count_new;
        let delta = mean_new - &self.theta.row(position);
        let mean = &self.theta.row(position) + &delta.mapv(|d| d * (count_new / count));
        let m2 = &self.m2.row(position)
            + m2_new
            + &delta.mapv(|d| d * d * (count_old * count_new / count));

        self.class_count[position] = count;
        self.theta.row_mut(position).assign(&mean);
        self.m2.row_mut(position).assign(&m2);
    }

    /// Pool the per-class moments into per-feature global variances and
    /// refresh the variance floor from their maximum
    fn refresh_epsilon(&mut self, var_smoothing: F) -> Result<()> {
        let nfeatures = self.theta.ncols();
        let mut count = F::zero();
        let mut mean = Array1::<F>::zeros(nfeatures);
        let mut m2 = Array1::<F>::zeros(nfeatures);

        for position in 0..self.registry.len() {
            let count_new = self.class_count[position];
            if count_new == F::zero() {
                continue;
            }
            if count == F::zero() {
                count = count_new;
                mean.assign(&self.theta.row(position));
                m2.assign(&self.m2.row(position));
                continue;
            }

            let total = count + count_new;
            let delta = &self.theta.row(position) - &mean;
            mean = &mean + &delta.mapv(|d| d * (count_new / total));
            m2 = &m2
                + &self.m2.row(position)
                + &delta.mapv(|d| d * d * (count * count_new / total));
            count = total;
        }

        let global_variance = m2.mapv(|v| v / count);
        self.epsilon = var_smoothing * *global_variance.max()?;

        Ok(())
    }
}

impl<F, L> NaiveBayes<F, L> for GaussianNb<F, L>
where
    F: Float,
    L: Label,
{
    fn classes(&self) -> &[L] {
        self.registry.classes()
    }

    // Compute unnormalized posterior log probability
    fn joint_log_likelihood(&self, x: ArrayView2<F>) -> Array2<F> {
        let variance = self.variance();
        let mut joint_log_likelihood = Array2::zeros((x.nrows(), self.registry.len()));

        for position in 0..self.registry.len() {
            let jointi = self.priors[position].ln();

            let mut nij = variance
                .row(position)
                .mapv(|v| F::cast(2. * std::f64::consts::PI) * v)
                .mapv(|v| v.ln())
                .sum();
            nij = F::cast(-0.5) * nij;

            let nij = ((x.to_owned() - &self.theta.row(position)).mapv(|v| v.powi(2))
                / &variance.row(position))
                .sum_axis(Axis(1))
                .mapv(|v| v * F::cast(0.5))
                .mapv(|v| nij - v);

            joint_log_likelihood
                .column_mut(position)
                .assign(&(nij + jointi));
        }

        joint_log_likelihood
    }
}
