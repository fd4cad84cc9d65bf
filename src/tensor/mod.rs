//! tensor — array substrate shared by models, losses and algorithms.
//!
//! Purpose
//! -------
//! Fix the numeric vocabulary of the crate (`Tensor`, `ParamSet`,
//! `GradBundle`, `ShapeSpec`) on top of `ndarray`, and provide the shape
//! checks and broadcasting rules that the gradient-composition protocol
//! depends on.
//!
//! Key behaviors
//! -------------
//! - Rescale gradient bundles by per-example coefficients with explicit
//!   trailing-axis expansion ([`shapes::rescale_bundle`],
//!   [`shapes::rescale_by_outputs`]).
//! - Validate parameter tensors against declared shapes and reconcile
//!   aggregated directions with their parameters ([`shapes::squeeze_leading`]).
//! - Provide row-wise helpers used by the high-dimensional median estimators
//!   (pairwise distances, row norms) and label encodings used by
//!   classification losses and corruption experiments.
//!
//! Invariants & assumptions
//! ------------------------
//! - Parameter tensors have rank ≥ 2.
//! - Batch tensors keep examples on axis 0.
//! - All shape problems are reported as [`errors::ShapeError`]; nothing here
//!   reshapes silently.
//!
//! Conventions
//! -----------
//! - Functions return owned arrays; callers are free to mutate results in
//!   place without aliasing anyone else's data.
//! - This module performs no logging and no I/O.

pub mod errors;
pub mod linalg;
pub mod shapes;
pub mod types;

pub use self::errors::{ShapeError, ShapeResult};
pub use self::types::{GradBundle, ParamSet, SCALAR_PARAM_SHAPE, ShapeSpec, StepSizes, Tensor};

pub mod prelude {
    pub use super::errors::{ShapeError, ShapeResult};
    pub use super::types::{GradBundle, ParamSet, ShapeSpec, StepSizes, Tensor};
}
