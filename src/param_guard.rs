//! Verification of hyperparameter sets
use crate::dataset::{DatasetBase, Records};
use crate::traits::{Fit, FitWith};

/// A set of hyperparameters whose values have not been checked for
/// validity. A reference to the checked hyperparameters can only be
/// obtained after checking has completed. If the `Fit` or `FitWith` traits
/// have been implemented on the checked hyperparameters, they are also
/// implemented on the unchecked set with the checking step done
/// automatically.
///
/// The validation performed by `check_ref()` and `check()` must be
/// identical.
pub trait ParamGuard {
    /// The checked hyperparameters
    type Checked;
    /// Error raised by the check
    type Error: std::error::Error;

    /// Checks the hyperparameters and returns a reference to the checked
    /// hyperparameters if successful
    fn check_ref(&self) -> Result<&Self::Checked, Self::Error>;

    /// Checks the hyperparameters and returns the checked hyperparameters
    /// if successful
    fn check(self) -> Result<Self::Checked, Self::Error>;

    /// Calls `check()` and unwraps the result
    fn check_unwrap(self) -> Self::Checked
    where
        Self: Sized,
    {
        self.check().unwrap()
    }
}

/// Performs the checking step and calls `fit` on the checked
/// hyperparameters. This allows unchecked parameter sets to be fitted
/// directly; errors from both checking and estimation are forwarded.
impl<P, R, T, E> Fit<R, T, E> for P
where
    P: ParamGuard,
    P::Checked: Fit<R, T, E>,
    R: Records,
    E: std::error::Error + From<P::Error>,
{
    type Object = <P::Checked as Fit<R, T, E>>::Object;

    fn fit(&self, dataset: &DatasetBase<R, T>) -> Result<Self::Object, E> {
        let checked = self.check_ref().map_err(E::from)?;
        checked.fit(dataset)
    }
}

/// Performs the checking step and calls `fit_with` on the checked
/// hyperparameters.
impl<'a, P, R, T, E> FitWith<'a, R, T, E> for P
where
    P: ParamGuard,
    P::Checked: FitWith<'a, R, T, E>,
    R: Records,
    E: std::error::Error + From<P::Error>,
{
    type ObjectIn = <P::Checked as FitWith<'a, R, T, E>>::ObjectIn;
    type ObjectOut = <P::Checked as FitWith<'a, R, T, E>>::ObjectOut;

    fn fit_with(
        &self,
        model: Self::ObjectIn,
        dataset: &'a DatasetBase<R, T>,
    ) -> Result<Self::ObjectOut, E> {
        let checked = self.check_ref().map_err(E::from)?;
        checked.fit_with(model, dataset)
    }
}
