//! tensor::types — shared numeric aliases for the optimization core.
//!
//! Purpose
//! -------
//! Centralize the tensor and mapping types passed between models, losses,
//! robust estimators and algorithms, so the rest of the crate stays agnostic
//! to `ndarray` generics.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every parameter tensor has rank ≥ 2; logically scalar parameters are
//!   stored as shape `(1, 1)`.
//! - Gradient bundles carry a leading batch axis of length `n` followed by the
//!   axes of the parameter they differentiate.
//! - Maps are `BTreeMap`s so that iteration order (and therefore flattening
//!   order for the quasi-Newton fitter) is deterministic.
use ndarray::ArrayD;
use std::collections::BTreeMap;

/// Dense n-dimensional `f64` array; batch tensors keep examples on axis 0.
pub type Tensor = ArrayD<f64>;

/// Parameter name → parameter tensor. Owned by a model.
pub type ParamSet = BTreeMap<String, Tensor>;

/// Parameter name → per-example derivative tensor of shape `(n, param.shape…)`.
pub type GradBundle = BTreeMap<String, Tensor>;

/// Parameter name → declared shape.
pub type ShapeSpec = BTreeMap<String, Vec<usize>>;

/// Per-parameter step coefficients as used by line-search updates.
pub type StepSizes = BTreeMap<String, f64>;

/// Shape used for logically scalar parameters.
pub const SCALAR_PARAM_SHAPE: [usize; 2] = [1, 1];
