use super::{AsSingleTargets, Label, Labels};
use ndarray::{ArrayBase, ArrayView1, Data, Ix1};
use std::collections::HashSet;

/// A 1-D NdArray can act as single targets
impl<L, S: Data<Elem = L>> AsSingleTargets for ArrayBase<S, Ix1> {
    type Elem = L;

    fn as_single_targets(&self) -> ArrayView1<Self::Elem> {
        self.view()
    }
}

/// A 1-D NdArray with discrete labels can act as labels
impl<L: Label, S: Data<Elem = L>> Labels for ArrayBase<S, Ix1> {
    type Elem = L;

    fn labels(&self) -> Vec<L> {
        self.iter()
            .cloned()
            .collect::<HashSet<L>>()
            .into_iter()
            .collect()
    }
}
