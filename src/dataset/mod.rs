//! Datasets
//!
//! This module implements the dataset struct and the helper traits that
//! connect record matrices and target arrays to the estimation traits.
use ndarray::{Array1, ArrayBase, ArrayView, ArrayView1, Ix1, Ix2, NdFloat, OwnedRepr};

use num_traits::{FromPrimitive, NumCast};

use std::fmt;
use std::hash::Hash;
use std::iter::Sum;

mod impl_dataset;
mod impl_records;
mod impl_targets;

/// Floating point numbers
///
/// This trait bound multiplexes the most common assumptions made about
/// floating point numbers and implements them for 32bit and 64bit floats.
/// They are used in the records of a dataset and in estimated model
/// parameters.
pub trait Float: NdFloat + FromPrimitive + Default + Sum + approx::AbsDiffEq<Epsilon = Self> {
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }
}

impl Float for f32 {}
impl Float for f64 {}

/// Discrete labels
///
/// Labels are countable, comparable and hashable. Boolean (binary tasks),
/// integer and string labels are supported.
pub trait Label: PartialEq + Eq + Hash + Clone + Ord + fmt::Debug + Default {}

impl Label for bool {}
impl Label for usize {}
impl Label for u32 {}
impl Label for u64 {}
impl Label for String {}
impl Label for &'static str {}

/// DatasetBase
///
/// This is the fundamental structure of a dataset. It couples records with
/// one target per sample and may carry per-sample weights. To keep the type
/// complexity low the dataset is only generic over records and targets;
/// `weights` are always owned and copied when views are created.
///
/// # Fields
///
/// * `records`: a two-dimensional matrix with dimensionality (nsamples, nfeatures)
/// * `targets`: a one-dimensional array with dimensionality (nsamples)
/// * `weights`: optional weights for each sample with dimensionality (nsamples);
///   an empty array means that all samples are weighted equally
pub struct DatasetBase<R, T>
where
    R: Records,
{
    pub records: R,
    pub targets: T,

    pub weights: Array1<f32>,
}

/// The most commonly used owned dataset type: records stored as an
/// `Array2<F>`, one label of type `L` per record.
pub type Dataset<F, L> = DatasetBase<ArrayBase<OwnedRepr<F>, Ix2>, ArrayBase<OwnedRepr<L>, Ix1>>;

/// A read-only view of a [`Dataset`]
pub type DatasetView<'a, F, L> = DatasetBase<ArrayView<'a, F, Ix2>, ArrayView<'a, L, Ix1>>;

/// Record trait
pub trait Records: Sized {
    type Elem;

    fn nsamples(&self) -> usize;
    fn nfeatures(&self) -> usize;
}

/// Return a reference to the single target variable of each sample
pub trait AsSingleTargets {
    type Elem;

    /// Returns a view on the targets as a one-dimensional array
    fn as_single_targets(&self) -> ArrayView1<Self::Elem>;
}

/// Targets with a discrete label alphabet
pub trait Labels {
    type Elem: Label;

    /// Returns the unique labels, in no particular order
    fn labels(&self) -> Vec<Self::Elem>;
}
