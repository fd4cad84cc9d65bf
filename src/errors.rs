//! errors — crate-wide error surface.
//!
//! Purpose
//! -------
//! Collect the domain error enums (`ShapeError`, `ConfigError`) and the few
//! failures that belong to no single domain into one enum, [`ErmError`], with a
//! shared result alias [`ErmResult<T>`]. Models, losses, robust estimators and
//! algorithms all return `ErmResult<T>` so callers match on one type.
//!
//! Conventions
//! -----------
//! - Shape and configuration problems are always fatal to the current call and
//!   propagate immediately; nothing is partially applied.
//! - Numeric degeneracies (zero sample scale, coincident points) are absorbed
//!   at the site where they occur and never surface here.
//! - Backend (`argmin`) failures are flattened into [`ErmError::Solver`] so the
//!   raw `argmin::core::Error` never crosses a module boundary.
use argmin::core::{ArgminError, Error};
use thiserror::Error as ThisError;

use crate::{config::errors::ConfigError, tensor::errors::ShapeError};

/// Crate-wide result alias.
pub type ErmResult<T> = Result<T, ErmError>;

#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum ErmError {
    // ---- Domain errors ----
    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    // ---- Capability ----
    /// The component does not provide the requested derivative or quantity.
    #[error("Not implemented: {what}")]
    NotImplemented { what: String },

    // ---- Objective / solver ----
    /// An objective evaluated to NaN or ±∞ inside the quasi-Newton fitter.
    #[error("Non-finite objective value: {value}")]
    NonFiniteObjective { value: f64 },

    /// A flattened objective gradient carried NaN or ±∞.
    #[error("Non-finite gradient entry {index}: {value}")]
    NonFiniteGradient { index: usize, value: f64 },

    /// The solver finished without a usable parameter vector.
    #[error("Invalid solver result: {reason}")]
    InvalidSolution { reason: &'static str },

    /// Wrapper for `argmin` backend errors.
    #[error("Solver error: {text}")]
    Solver { text: String },
}

impl ErmError {
    pub fn not_implemented(what: impl Into<String>) -> Self {
        ErmError::NotImplemented { what: what.into() }
    }
}

impl From<Error> for ErmError {
    fn from(original_err: Error) -> Self {
        // Errors we raised ourselves inside argmin callbacks come back intact.
        let original_err = match original_err.downcast::<ErmError>() {
            Ok(err) => return err,
            Err(err) => err,
        };
        match original_err.downcast::<ArgminError>() {
            Ok(argmin_err) => ErmError::Solver { text: argmin_err.to_string() },
            Err(err) => ErmError::Solver { text: err.to_string() },
        }
    }
}
