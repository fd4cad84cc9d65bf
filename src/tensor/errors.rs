//! Shape errors raised anywhere tensors meet.
//!
//! Every variant describes a mismatch between a declared or expected shape and
//! the shape actually received. None of them is recoverable inside the call
//! that raised it; there is exactly one documented reshape in the crate (the
//! leading-singleton squeeze in robust gradient descent) and it never goes
//! through this type.
use thiserror::Error;

pub type ShapeResult<T> = Result<T, ShapeError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    // ---- Parameters ----
    /// A tensor bound to a parameter name does not have the declared shape.
    #[error("Shape mismatch for parameter '{name}': expected {expected:?}, found {found:?}")]
    ParamShapeMismatch { name: String, expected: Vec<usize>, found: Vec<usize> },

    /// Parameters must have at least two axes, scalars included.
    #[error("Parameter '{name}' has rank {rank}; parameters need rank >= 2")]
    ParamRankTooSmall { name: String, rank: usize },

    /// A direction could not be reconciled with its parameter.
    #[error(
        "Direction for '{name}' has shape {direction:?}, incompatible with parameter shape {param:?}"
    )]
    DirectionMismatch { name: String, direction: Vec<usize>, param: Vec<usize> },

    // ---- Gradient composition ----
    /// A per-example derivative has more axes than the Jacobian it rescales.
    #[error(
        "Axis inversion for '{name}': coefficient rank {coeff_rank} exceeds Jacobian rank {jacobian_rank}"
    )]
    RankInversion { name: String, coeff_rank: usize, jacobian_rank: usize },

    /// A per-example coefficient cannot be broadcast against a Jacobian.
    #[error("Cannot broadcast coefficients {coeffs:?} against Jacobian {jacobian:?} for '{name}'")]
    NotBroadcastable { name: String, coeffs: Vec<usize>, jacobian: Vec<usize> },

    // ---- Batches ----
    /// Model outputs (or loss values) and targets disagree.
    #[error("Output shape {output:?} does not match target shape {target:?}: {reason}")]
    OutputTargetMismatch { output: Vec<usize>, target: Vec<usize>, reason: &'static str },

    /// A tensor had the wrong number of axes for the operation.
    #[error("Invalid rank for {what}: expected {expected}, found {found}")]
    InvalidRank { what: &'static str, expected: usize, found: usize },

    /// Inputs whose trailing axes do not line up.
    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimMismatch { what: &'static str, expected: usize, found: usize },

    /// Reductions over the batch axis need at least one example.
    #[error("Empty batch for {what}")]
    EmptyBatch { what: &'static str },
}
