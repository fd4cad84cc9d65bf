//! L-BFGS solver construction.
//!
//! Builders only pick the line search, the history size and the optional
//! tolerances. The initial parameters and the iteration cap are runtime
//! concerns applied by [`run_lbfgs`](super::run::run_lbfgs).
use argmin::solver::quasinewton::LBFGS;

use crate::{
    algos::quasi_newton::{
        options::LbfgsOptions,
        types::{Cost, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente, MoreThuenteLS, Theta},
    },
    errors::ErmResult,
};

/// L-BFGS with Hager–Zhang line search.
///
/// # Errors
/// - `ErmError::Solver` if argmin rejects a tolerance.
pub fn build_optimizer_hager_zhang(opts: &LbfgsOptions) -> ErmResult<LbfgsHagerZhang> {
    let lbfgs = LbfgsHagerZhang::new(HagerZhangLS::new(), opts.memory());
    configure_lbfgs(lbfgs, opts)
}

/// L-BFGS with More–Thuente line search.
///
/// # Errors
/// - `ErmError::Solver` if argmin rejects a tolerance.
pub fn build_optimizer_more_thuente(opts: &LbfgsOptions) -> ErmResult<LbfgsMoreThuente> {
    let lbfgs = LbfgsMoreThuente::new(MoreThuenteLS::new(), opts.memory());
    configure_lbfgs(lbfgs, opts)
}

/// Apply the optional gradient and cost tolerances. Absent tolerances keep
/// argmin's defaults.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &LbfgsOptions,
) -> ErmResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algos::quasi_newton::options::{LineSearcher, Tolerances};

    #[test]
    // Purpose
    // -------
    // Ensure both builders accept valid tolerances with default and explicit
    // memory.
    //
    // Given
    // -----
    // - Tolerances (1e-6, 1e-8, 50); memory None and Some(11).
    //
    // Expect
    // ------
    // - Every builder call returns `Ok`.
    fn builders_accept_valid_options() {
        let tols = Tolerances::new(Some(1e-6), Some(1e-8), Some(50)).unwrap();
        for mem in [None, Some(11)] {
            let hz = LbfgsOptions::new(tols, LineSearcher::HagerZhang, false, mem).unwrap();
            let mt = LbfgsOptions::new(tols, LineSearcher::MoreThuente, false, mem).unwrap();
            assert!(build_optimizer_hager_zhang(&hz).is_ok());
            assert!(build_optimizer_more_thuente(&mt).is_ok());
        }
    }
}
