//! models — parametrized prediction functions.
//!
//! Purpose
//! -------
//! Provide the `Model` contract (value, per-example Jacobian, optional
//! Hessian over a named parameter set) and its concrete implementations.
//!
//! Key behaviors
//! -------------
//! - Parameters live in a [`traits::ParamStore`]: declared shapes plus current
//!   values, validated at construction and randomly initialized in
//!   `[-INIT_RANGE, INIT_RANGE)` when not supplied.
//! - [`attach_auxiliary`] appends a loss's auxiliary scalars (e.g. the CVaR
//!   threshold `v`) to a model so that algorithms update them alongside the
//!   model's own parameters.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every parameter has rank ≥ 2 and keeps its shape for the model's lifetime.
//! - `evaluate`/`gradient` never mutate the parameter set they are given.
//! - Jacobian entries carry one slice per example on axis 0.
//!
//! Downstream usage
//! ----------------
//! - Losses call `Model::evaluate` and `Model::gradient`; algorithms mutate
//!   parameters through `Model::paras_mut`.
use crate::{
    errors::ErmResult,
    losses::traits::Loss,
    tensor::types::{SCALAR_PARAM_SHAPE, Tensor},
};

pub mod linear;
pub mod traits;

pub use self::linear::LinearRegression;
pub use self::traits::{INIT_RANGE, Model, ParamStore};

/// Declare every auxiliary parameter of `loss` on `model` as a `(1, 1)`
/// tensor holding the loss's initial value.
///
/// # Errors
/// - `ConfigError::DuplicateParameter` if an auxiliary name is already a
///   parameter of the model. Parameters declared before the failing one stay
///   attached.
pub fn attach_auxiliary<M: Model + ?Sized>(model: &mut M, loss: &dyn Loss) -> ErmResult<()> {
    for (name, init) in loss.auxiliary() {
        let value = Tensor::from_elem(SCALAR_PARAM_SHAPE.as_slice(), init);
        model.store_mut().add(&name, value)?;
    }
    Ok(())
}

pub mod prelude {
    pub use super::attach_auxiliary;
    pub use super::linear::LinearRegression;
    pub use super::traits::{INIT_RANGE, Model, ParamStore};
}
