//! `savia` provides the shared vocabulary for a small family of classical
//! Machine Learning crates: dataset containers, the estimation and
//! prediction traits, and hyperparameter validation.
//!
//! Algorithm crates live under `algorithms/` and only depend on this core.
//! The core itself never performs I/O; callers hand in ready-made record
//! matrices and target arrays.

pub mod dataset;
pub mod error;
mod param_guard;
pub mod prelude;
pub mod traits;

pub use dataset::{Dataset, DatasetBase, DatasetView, Float, Label};
pub use error::Error;
pub use param_guard::ParamGuard;
