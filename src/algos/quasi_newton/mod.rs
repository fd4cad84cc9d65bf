//! quasi_newton — argmin-powered L-BFGS batch fitter.
//!
//! Purpose
//! -------
//! Minimize a loss objective over all of a model's parameters (auxiliary
//! wrapper parameters included) with L-BFGS, as a full-batch alternative to
//! the first-order line searches in [`crate::algos`].
//!
//! Key behaviors
//! -------------
//! - Flatten the parameter set into one vector via [`types::ParamLayout`].
//! - Expose the model/loss/batch triple as an argmin problem through
//!   [`adapter::ErmProblem`]: cost = `Loss::objective`, gradient =
//!   `Loss::objective_gradient`, with a finite-difference fallback when the
//!   loss reports `NotImplemented`.
//! - Build L-BFGS with the configured line search ([`builders`]), run it
//!   ([`run::run_lbfgs`]) and write the best parameters back into the model.
//!
//! Invariants & assumptions
//! ------------------------
//! - The objective must be finite wherever the solver evaluates it; a
//!   non-finite value aborts the run with `ErmError::NonFiniteObjective`.
//! - Options are validated on construction ([`LbfgsOptions::new`],
//!   [`Tolerances::new`]).
//!
//! Conventions
//! -----------
//! - Parameters are written back only after a successful run; on error the
//!   model keeps its starting parameters.
//!
//! Testing notes
//! -------------
//! - Unit tests cover layout round trips, option validation, builder wiring,
//!   and analytic vs finite-difference gradients.
//! - The integration tests fit least squares to its closed-form solution.

pub mod adapter;
pub mod builders;
pub mod options;
pub mod run;
pub mod types;

use tracing::info;

use crate::{
    algos::quasi_newton::{
        adapter::ErmProblem,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::run_lbfgs,
    },
    errors::ErmResult,
    losses::traits::Loss,
    models::traits::Model,
    tensor::types::Tensor,
};

pub use self::options::{FitOutcome, LbfgsOptions, LineSearcher, Tolerances};
pub use self::types::{DEFAULT_LBFGS_MEM, ParamLayout};

/// Fit `model` to `(x, y)` by minimizing `loss.objective` with L-BFGS.
///
/// # Errors
/// - Shape and configuration errors from the model or loss (raised on the
///   first evaluation).
/// - `ErmError::NonFiniteObjective`, `NonFiniteGradient` or `Solver` for
///   numeric and backend failures.
pub fn fit_lbfgs(
    model: &mut dyn Model, loss: &dyn Loss, x: &Tensor, y: &Tensor, opts: &LbfgsOptions,
) -> ErmResult<FitOutcome> {
    model.store().validate(model.paras())?;
    let layout = ParamLayout::of(model.paras());
    let theta0 = layout.flatten(model.paras())?;
    let outcome = {
        let problem = ErmProblem::new(&*model, loss, x, y, &layout);
        match opts.line_searcher {
            LineSearcher::MoreThuente => {
                let solver = build_optimizer_more_thuente(opts)?;
                run_lbfgs(theta0, opts, problem, solver)?
            }
            LineSearcher::HagerZhang => {
                let solver = build_optimizer_hager_zhang(opts)?;
                run_lbfgs(theta0, opts, problem, solver)?
            }
        }
    };
    *model.paras_mut() = outcome.params.clone();
    info!(
        model = model.name(),
        loss = %loss.name(),
        objective = outcome.objective,
        iterations = outcome.iterations,
        converged = outcome.converged,
        "L-BFGS fit complete"
    );
    Ok(outcome)
}

pub mod prelude {
    pub use super::fit_lbfgs;
    pub use super::options::{FitOutcome, LbfgsOptions, LineSearcher, Tolerances};
}
