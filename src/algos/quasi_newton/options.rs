//! Configuration and result types for the L-BFGS fitter.
//!
//! - [`LineSearcher`]: line search used inside L-BFGS, parsed by name.
//! - [`Tolerances`] and [`LbfgsOptions`]: stopping rules and solver settings,
//!   validated on construction.
//! - [`FitOutcome`]: normalized result of [`fit_lbfgs`](super::fit_lbfgs).
use argmin::core::TerminationStatus;
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

use crate::{
    algos::quasi_newton::types::{DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta},
    config::errors::{ConfigError, ConfigResult},
    errors::{ErmError, ErmResult},
    tensor::{errors::ShapeError, types::ParamSet},
};

/// Line search used inside the L-BFGS solver.
///
/// Parsing is case-insensitive: `"MoreThuente"` or `"HagerZhang"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(ConfigError::UnknownName {
                kind: "line search",
                name: s.to_string(),
                expected: "case insensitive 'MoreThuente' or 'HagerZhang'",
            }),
        }
    }
}

/// Stopping rules. At least one must be set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// # Errors
    /// - `ConfigError::MissingHyperparameter` if all three are `None`.
    /// - `ConfigError::InvalidHyperparameter` for a non-finite or
    ///   non-positive tolerance.
    /// - `ConfigError::InvalidIterations` if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> ConfigResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(ConfigError::MissingHyperparameter {
                name: "tol_grad, tol_cost or max_iter".to_string(),
            });
        }
        verify_tol("tol_grad", tol_grad)?;
        verify_tol("tol_cost", tol_cost)?;
        if max_iter == Some(0) {
            return Err(ConfigError::InvalidIterations {
                name: "max_iter".to_string(),
                value: 0,
                reason: "Maximum iterations must be greater than zero.",
            });
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

fn verify_tol(name: &str, tol: Option<f64>) -> ConfigResult<()> {
    match tol {
        Some(t) if !t.is_finite() => Err(ConfigError::invalid(name, t, "Tolerance must be finite.")),
        Some(t) if t <= 0.0 => Err(ConfigError::invalid(name, t, "Tolerance must be positive.")),
        _ => Ok(()),
    }
}

/// L-BFGS settings.
///
/// Default: `tol_grad = 1e-6`, no cost tolerance, `max_iter = 300`,
/// More–Thuente line search, not verbose, memory [`DEFAULT_LBFGS_MEM`].
#[derive(Debug, Clone, PartialEq)]
pub struct LbfgsOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    /// Attach a terminal observer (requires the `obs_slog` feature).
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl LbfgsOptions {
    /// # Errors
    /// - `ConfigError::InvalidIterations` if `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, verbose: bool, lbfgs_mem: Option<usize>,
    ) -> ConfigResult<Self> {
        if lbfgs_mem == Some(0) {
            return Err(ConfigError::InvalidIterations {
                name: "lbfgs_mem".to_string(),
                value: 0,
                reason: "L-BFGS memory must be greater than zero.",
            });
        }
        Ok(Self { tols, line_searcher, verbose, lbfgs_mem })
    }

    pub fn memory(&self) -> usize {
        self.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM)
    }
}

impl Default for LbfgsOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-6), tol_cost: None, max_iter: Some(300) },
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

/// Result of an L-BFGS fit.
///
/// `objective` is the best value of the loss objective; `params` the
/// parameter set attaining it (also written back into the model).
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    pub params: ParamSet,
    pub objective: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl FitOutcome {
    /// # Errors
    /// - `ErmError::NonFiniteObjective` if `objective` is not finite.
    pub fn new(
        params: ParamSet, objective: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> ErmResult<Self> {
        if !objective.is_finite() {
            return Err(ErmError::NonFiniteObjective { value: objective });
        }
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            other => (true, format!("{other:?}")),
        };
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self { params, objective, converged, status, iterations: iterations as usize, fn_evals, grad_norm })
    }
}

/// Accept only a present, all-finite parameter vector.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> ErmResult<Theta> {
    let theta = theta_hat.ok_or(ErmError::InvalidSolution { reason: "no best parameter vector" })?;
    if !theta.iter().all(|v| v.is_finite()) {
        return Err(ErmError::InvalidSolution { reason: "parameter estimates must be finite" });
    }
    Ok(theta)
}

/// Require a flat gradient of length `dim` with finite entries.
pub fn validate_grad(grad: &Grad, dim: usize) -> ErmResult<()> {
    if grad.len() != dim {
        return Err(ShapeError::DimMismatch {
            what: "flattened gradient",
            expected: dim,
            found: grad.len(),
        }
        .into());
    }
    match grad.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        Some((index, &value)) => Err(ErmError::NonFiniteGradient { index, value }),
        None => Ok(()),
    }
}
