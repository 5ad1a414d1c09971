#![doc = include_str!("../README.md")]

mod base_nb;
mod categorical_nb;
mod complement_nb;
mod error;
mod gaussian_nb;
mod hyperparams;
mod multinomial_nb;
mod registry;
mod smoothing;

pub use base_nb::NaiveBayes;
pub use categorical_nb::CategoricalNb;
pub use complement_nb::ComplementNb;
pub use error::{NaiveBayesError, Result};
pub use gaussian_nb::GaussianNb;
pub use hyperparams::{
    CategoricalNbParams, CategoricalNbValidParams, ComplementNbParams, ComplementNbValidParams,
    GaussianNbParams, GaussianNbValidParams, MultinomialNbParams, MultinomialNbValidParams,
};
pub use multinomial_nb::MultinomialNb;
pub use registry::ClassRegistry;
pub use smoothing::{smoothed_log_ratio, smoothed_ratio};

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use savia::{Float, Label};

/// Returns the rows of `x` and the entries of `weights` whose label equals
/// `ycondition`
fn filter<F: Float, L: Label>(
    x: ArrayView2<F>,
    y: ArrayView1<L>,
    weights: ArrayView1<F>,
    ycondition: &L,
) -> (Array2<F>, Array1<F>) {
    // identify the row numbers corresponding to the class of interest
    let index = y
        .into_iter()
        .enumerate()
        .filter_map(|(i, y)| if ycondition == y { Some(i) } else { None })
        .collect::<Vec<_>>();

    let mut xsubset = Array2::zeros((index.len(), x.ncols()));
    let mut wsubset = Array1::zeros(index.len());
    for (i, &r) in index.iter().enumerate() {
        xsubset.row_mut(i).assign(&x.row(r));
        wsubset[i] = weights[r];
    }

    (xsubset, wsubset)
}
