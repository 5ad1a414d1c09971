//! Hyperparameter sets of the Naive Bayes models
//!
//! Every model has an unchecked `*Params` builder wrapping a
//! `*ValidParams` set. [`ParamGuard::check`] validates the values;
//! fitting an unchecked set performs the check implicitly and forwards
//! any error.
use ndarray::Array1;

use savia::{Float, ParamGuard};

use crate::error::NaiveBayesError;

/// A verified hyperparameter set ready for the estimation of a Gaussian
/// Naive Bayes model
///
/// See [`GaussianNb`](crate::GaussianNb) for information on the model.
///
/// # Parameters
///
/// | Name | Default | Purpose | Range |
/// | :--- | :--- | :--- | :--- |
/// | `var_smoothing` | `1e-9` | Fraction of the largest pooled feature variance used as a variance floor | `[0, inf)` |
/// | `priors` | `None` | Fixed class priors, bypassing estimation | probability vector |
/// | `classes` | `None` | Class set declared ahead of the first incremental fit | unique labels |
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianNbValidParams<F, L> {
    var_smoothing: F,
    priors: Option<Array1<F>>,
    classes: Option<Vec<L>>,
}

impl<F: Float, L> GaussianNbValidParams<F, L> {
    /// Get the variance smoothing fraction
    pub fn var_smoothing(&self) -> F {
        self.var_smoothing
    }

    /// Get the fixed class priors, if declared
    pub fn priors(&self) -> Option<&Array1<F>> {
        self.priors.as_ref()
    }

    /// Get the declared class set, if any
    pub fn classes(&self) -> Option<&Vec<L>> {
        self.classes.as_ref()
    }
}

/// An unchecked hyperparameter set for Gaussian Naive Bayes; see
/// [`GaussianNbValidParams`] for the parameter documentation
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianNbParams<F, L>(GaussianNbValidParams<F, L>);

impl<F: Float, L> Default for GaussianNbParams<F, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float, L> GaussianNbParams<F, L> {
    /// Create a new parameter set with default values
    pub fn new() -> Self {
        Self(GaussianNbValidParams {
            var_smoothing: F::cast(1e-9),
            priors: None,
            classes: None,
        })
    }

    /// Specify the portion of the largest pooled feature variance used to
    /// floor per-class variances for calculation stability
    pub fn var_smoothing(mut self, var_smoothing: F) -> Self {
        self.0.var_smoothing = var_smoothing;
        self
    }

    /// Fix the class priors instead of estimating them from the data
    pub fn priors(mut self, priors: Array1<F>) -> Self {
        self.0.priors = Some(priors);
        self
    }

    /// Declare the full class set ahead of the first incremental fit call
    pub fn classes(mut self, classes: Vec<L>) -> Self {
        self.0.classes = Some(classes);
        self
    }
}

impl<F: Float, L> ParamGuard for GaussianNbParams<F, L> {
    type Checked = GaussianNbValidParams<F, L>;
    type Error = NaiveBayesError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.var_smoothing < F::zero() {
            return Err(NaiveBayesError::InvalidSmoothing(
                self.0.var_smoothing.to_f64().unwrap(),
            ));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// A verified hyperparameter set ready for the estimation of a Multinomial
/// Naive Bayes model
///
/// See [`MultinomialNb`](crate::MultinomialNb) for information on the model.
///
/// # Parameters
///
/// | Name | Default | Purpose | Range |
/// | :--- | :--- | :--- | :--- |
/// | `alpha` | `1` | Additive (Laplace/Lidstone) smoothing parameter | `[0, inf)` |
/// | `fit_prior` | `true` | Estimate priors from class frequencies; uniform otherwise | - |
/// | `class_prior` | `None` | Fixed class priors, bypassing estimation | probability vector |
/// | `classes` | `None` | Class set declared ahead of the first incremental fit | unique labels |
#[derive(Debug, Clone, PartialEq)]
pub struct MultinomialNbValidParams<F, L> {
    alpha: F,
    fit_prior: bool,
    class_prior: Option<Array1<F>>,
    classes: Option<Vec<L>>,
}

impl<F: Float, L> MultinomialNbValidParams<F, L> {
    /// Get the smoothing parameter
    pub fn alpha(&self) -> F {
        self.alpha
    }

    /// Whether priors are estimated from class frequencies
    pub fn fit_prior(&self) -> bool {
        self.fit_prior
    }

    /// Get the fixed class priors, if declared
    pub fn class_prior(&self) -> Option<&Array1<F>> {
        self.class_prior.as_ref()
    }

    /// Get the declared class set, if any
    pub fn classes(&self) -> Option<&Vec<L>> {
        self.classes.as_ref()
    }
}

/// An unchecked hyperparameter set for Multinomial Naive Bayes; see
/// [`MultinomialNbValidParams`] for the parameter documentation
#[derive(Debug, Clone, PartialEq)]
pub struct MultinomialNbParams<F, L>(MultinomialNbValidParams<F, L>);

impl<F: Float, L> Default for MultinomialNbParams<F, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float, L> MultinomialNbParams<F, L> {
    /// Create a new parameter set with default values
    pub fn new() -> Self {
        Self(MultinomialNbValidParams {
            alpha: F::one(),
            fit_prior: true,
            class_prior: None,
            classes: None,
        })
    }

    /// Specify the smoothing parameter
    pub fn alpha(mut self, alpha: F) -> Self {
        self.0.alpha = alpha;
        self
    }

    /// Estimate priors from class frequencies (`true`, the default) or use
    /// a uniform distribution (`false`)
    pub fn fit_prior(mut self, fit_prior: bool) -> Self {
        self.0.fit_prior = fit_prior;
        self
    }

    /// Fix the class priors instead of estimating them from the data
    pub fn class_prior(mut self, class_prior: Array1<F>) -> Self {
        self.0.class_prior = Some(class_prior);
        self
    }

    /// Declare the full class set ahead of the first incremental fit call
    pub fn classes(mut self, classes: Vec<L>) -> Self {
        self.0.classes = Some(classes);
        self
    }
}

impl<F: Float, L> ParamGuard for MultinomialNbParams<F, L> {
    type Checked = MultinomialNbValidParams<F, L>;
    type Error = NaiveBayesError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.alpha < F::zero() {
            return Err(NaiveBayesError::InvalidSmoothing(
                self.0.alpha.to_f64().unwrap(),
            ));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// A verified hyperparameter set ready for the estimation of a Complement
/// Naive Bayes model
///
/// See [`ComplementNb`](crate::ComplementNb) for information on the model.
///
/// # Parameters
///
/// | Name | Default | Purpose | Range |
/// | :--- | :--- | :--- | :--- |
/// | `alpha` | `1` | Additive (Laplace/Lidstone) smoothing parameter | `[0, inf)` |
/// | `fit_prior` | `true` | Estimate priors from class frequencies; uniform otherwise | - |
/// | `class_prior` | `None` | Fixed class priors, bypassing estimation | probability vector |
/// | `classes` | `None` | Class set declared ahead of the first incremental fit | unique labels |
#[derive(Debug, Clone, PartialEq)]
pub struct ComplementNbValidParams<F, L> {
    alpha: F,
    fit_prior: bool,
    class_prior: Option<Array1<F>>,
    classes: Option<Vec<L>>,
}

impl<F: Float, L> ComplementNbValidParams<F, L> {
    /// Get the smoothing parameter
    pub fn alpha(&self) -> F {
        self.alpha
    }

    /// Whether priors are estimated from class frequencies
    pub fn fit_prior(&self) -> bool {
        self.fit_prior
    }

    /// Get the fixed class priors, if declared
    pub fn class_prior(&self) -> Option<&Array1<F>> {
        self.class_prior.as_ref()
    }

    /// Get the declared class set, if any
    pub fn classes(&self) -> Option<&Vec<L>> {
        self.classes.as_ref()
    }
}

/// An unchecked hyperparameter set for Complement Naive Bayes; see
/// [`ComplementNbValidParams`] for the parameter documentation
#[derive(Debug, Clone, PartialEq)]
pub struct ComplementNbParams<F, L>(ComplementNbValidParams<F, L>);

impl<F: Float, L> Default for ComplementNbParams<F, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float, L> ComplementNbParams<F, L> {
    /// Create a new parameter set with default values
    pub fn new() -> Self {
        Self(ComplementNbValidParams {
            alpha: F::one(),
            fit_prior: true,
            class_prior: None,
            classes: None,
        })
    }

    /// Specify the smoothing parameter
    pub fn alpha(mut self, alpha: F) -> Self {
        self.0.alpha = alpha;
        self
    }

    /// Estimate priors from class frequencies (`true`, the default) or use
    /// a uniform distribution (`false`)
    pub fn fit_prior(mut self, fit_prior: bool) -> Self {
        self.0.fit_prior = fit_prior;
        self
    }

    /// Fix the class priors instead of estimating them from the data
    pub fn class_prior(mut self, class_prior: Array1<F>) -> Self {
        self.0.class_prior = Some(class_prior);
        self
    }

    /// Declare the full class set ahead of the first incremental fit call
    pub fn classes(mut self, classes: Vec<L>) -> Self {
        self.0.classes = Some(classes);
        self
    }
}

impl<F: Float, L> ParamGuard for ComplementNbParams<F, L> {
    type Checked = ComplementNbValidParams<F, L>;
    type Error = NaiveBayesError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.alpha < F::zero() {
            return Err(NaiveBayesError::InvalidSmoothing(
                self.0.alpha.to_f64().unwrap(),
            ));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// A verified hyperparameter set ready for the estimation of a Categorical
/// Naive Bayes model
///
/// See [`CategoricalNb`](crate::CategoricalNb) for information on the model.
///
/// # Parameters
///
/// | Name | Default | Purpose | Range |
/// | :--- | :--- | :--- | :--- |
/// | `alpha` | `1` | Additive (Laplace/Lidstone) smoothing parameter | `[0, inf)` |
/// | `fit_prior` | `true` | Estimate priors from class frequencies; uniform otherwise | - |
/// | `class_prior` | `None` | Fixed class priors, bypassing estimation | probability vector |
/// | `min_categories` | `None` | Lower bound on every feature's discovered cardinality | `[1, inf)` |
/// | `n_categories` | `None` | Explicit per-feature category cardinalities | entries `>= 1` |
/// | `classes` | `None` | Class set declared ahead of the first incremental fit | unique labels |
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalNbValidParams<F, L> {
    alpha: F,
    fit_prior: bool,
    class_prior: Option<Array1<F>>,
    min_categories: Option<usize>,
    n_categories: Option<Vec<usize>>,
    classes: Option<Vec<L>>,
}

impl<F: Float, L> CategoricalNbValidParams<F, L> {
    /// Get the smoothing parameter
    pub fn alpha(&self) -> F {
        self.alpha
    }

    /// Whether priors are estimated from class frequencies
    pub fn fit_prior(&self) -> bool {
        self.fit_prior
    }

    /// Get the fixed class priors, if declared
    pub fn class_prior(&self) -> Option<&Array1<F>> {
        self.class_prior.as_ref()
    }

    /// Get the lower cardinality bound, if declared
    pub fn min_categories(&self) -> Option<usize> {
        self.min_categories
    }

    /// Get the explicit per-feature cardinalities, if declared
    pub fn n_categories(&self) -> Option<&Vec<usize>> {
        self.n_categories.as_ref()
    }

    /// Get the declared class set, if any
    pub fn classes(&self) -> Option<&Vec<L>> {
        self.classes.as_ref()
    }
}

/// An unchecked hyperparameter set for Categorical Naive Bayes; see
/// [`CategoricalNbValidParams`] for the parameter documentation
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalNbParams<F, L>(CategoricalNbValidParams<F, L>);

impl<F: Float, L> Default for CategoricalNbParams<F, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float, L> CategoricalNbParams<F, L> {
    /// Create a new parameter set with default values
    pub fn new() -> Self {
        Self(CategoricalNbValidParams {
            alpha: F::one(),
            fit_prior: true,
            class_prior: None,
            min_categories: None,
            n_categories: None,
            classes: None,
        })
    }

    /// Specify the smoothing parameter
    pub fn alpha(mut self, alpha: F) -> Self {
        self.0.alpha = alpha;
        self
    }

    /// Estimate priors from class frequencies (`true`, the default) or use
    /// a uniform distribution (`false`)
    pub fn fit_prior(mut self, fit_prior: bool) -> Self {
        self.0.fit_prior = fit_prior;
        self
    }

    /// Fix the class priors instead of estimating them from the data
    pub fn class_prior(mut self, class_prior: Array1<F>) -> Self {
        self.0.class_prior = Some(class_prior);
        self
    }

    /// Raise every feature's discovered cardinality to at least
    /// `min_categories`
    pub fn min_categories(mut self, min_categories: usize) -> Self {
        self.0.min_categories = Some(min_categories);
        self
    }

    /// Declare the exact category cardinality of every feature; codes of
    /// the fitted data must already fit these bounds
    pub fn n_categories(mut self, n_categories: Vec<usize>) -> Self {
        self.0.n_categories = Some(n_categories);
        self
    }

    /// Declare the full class set ahead of the first incremental fit call
    pub fn classes(mut self, classes: Vec<L>) -> Self {
        self.0.classes = Some(classes);
        self
    }
}

impl<F: Float, L> ParamGuard for CategoricalNbParams<F, L> {
    type Checked = CategoricalNbValidParams<F, L>;
    type Error = NaiveBayesError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.alpha < F::zero() {
            return Err(NaiveBayesError::InvalidSmoothing(
                self.0.alpha.to_f64().unwrap(),
            ));
        }
        if let Some(min_categories) = self.0.min_categories {
            if min_categories == 0 {
                return Err(savia::Error::Parameters(
                    "min_categories must be at least 1".to_string(),
                )
                .into());
            }
        }
        if let Some(n_categories) = &self.0.n_categories {
            if n_categories.iter().any(|&cardinality| cardinality == 0) {
                return Err(savia::Error::Parameters(
                    "every declared category cardinality must be at least 1".to_string(),
                )
                .into());
            }
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}
