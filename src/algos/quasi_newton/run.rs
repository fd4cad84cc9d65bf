//! Execution helper: runs an `argmin` solver on an [`ErmProblem`] and turns
//! the final state into a [`FitOutcome`].
#[cfg(feature = "obs_slog")]
use argmin::core::{CostFunction, Gradient};
use argmin::core::{Executor, IterState, Solver, State};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;
use tracing::debug;

use crate::{
    algos::quasi_newton::{
        adapter::ErmProblem,
        options::{FitOutcome, LbfgsOptions, validate_theta_hat},
        types::{Grad, Theta},
    },
    errors::ErmResult,
};

/// Run `solver` from `theta0` and collect the best parameters.
///
/// With the `obs_slog` feature and `opts.verbose`, a terminal slog observer
/// is attached and the starting objective is logged once.
///
/// # Errors
/// - Any argmin runtime error, converted through `From<argmin::core::Error>`
///   (errors raised by the model or loss come back as their own variant).
/// - `ErmError::InvalidSolution` / `NonFiniteObjective` if the final state
///   is unusable.
pub fn run_lbfgs<'a, S>(
    theta0: Theta, opts: &LbfgsOptions, problem: ErmProblem<'a>, solver: S,
) -> ErmResult<FitOutcome>
where
    S: Solver<ErmProblem<'a>, IterState<Theta, Grad, (), (), (), f64>> + Send + 'static,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&theta0, &problem)?;
    }
    let layout = problem.layout().clone();
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    let theta_hat = validate_theta_hat(result.take_best_param())?;
    let params = layout.unflatten(&theta_hat)?;
    debug!(iterations, best = result.get_best_cost(), status = ?termination, "L-BFGS finished");
    FitOutcome::new(params, result.get_best_cost(), termination, iterations, function_counts, grad)
}

#[cfg(feature = "obs_slog")]
fn log_initial_state(theta0: &Theta, problem: &ErmProblem<'_>) -> ErmResult<()> {
    let f0 = problem.cost(theta0)?;
    let g0n = problem.gradient(theta0).ok().map(|g| g.l2_norm());
    tracing::info!(objective = f0, grad_norm = ?g0n, "L-BFGS initial state");
    Ok(())
}
