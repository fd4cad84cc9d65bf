//! Adapter that exposes a model/loss/batch triple as an `argmin` problem.
//!
//! The cost is the loss objective at the unflattened parameters; the gradient
//! is the loss's objective gradient, flattened with the same layout. When the
//! loss reports `NotImplemented` for its objective gradient we finite-difference
//! the cost instead.
use std::cell::RefCell;

use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

use crate::{
    algos::quasi_newton::{
        options::validate_grad,
        types::{Cost, Grad, ParamLayout, Theta},
    },
    errors::ErmError,
    losses::traits::Loss,
    models::traits::Model,
    tensor::types::Tensor,
};

/// Bridges a model, loss and batch to `argmin`'s `CostFunction` and
/// `Gradient`.
pub struct ErmProblem<'a> {
    model: &'a dyn Model,
    loss: &'a dyn Loss,
    x: &'a Tensor,
    y: &'a Tensor,
    layout: &'a ParamLayout,
}

impl<'a> ErmProblem<'a> {
    pub fn new(
        model: &'a dyn Model, loss: &'a dyn Loss, x: &'a Tensor, y: &'a Tensor,
        layout: &'a ParamLayout,
    ) -> Self {
        Self { model, loss, x, y, layout }
    }

    pub fn layout(&self) -> &ParamLayout {
        self.layout
    }

    /// Finite-difference gradient of the cost: central differences first,
    /// forward differences if a cost evaluation failed or the result is not
    /// finite.
    fn finite_difference(&self, theta: &Theta) -> Result<Grad, Error> {
        let dim = theta.len();
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let cost_func = |theta: &Theta| -> f64 {
            match self.cost(theta) {
                Ok(val) => val,
                Err(e) => {
                    let mut slot = closure_err.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    f64::NAN
                }
            }
        };
        let fd_grad = theta.central_diff(&cost_func);
        if closure_err.borrow().is_none() && validate_grad(&fd_grad, dim).is_ok() {
            return Ok(fd_grad);
        }
        run_forward_diff(theta, &cost_func, &closure_err)
    }
}

impl CostFunction for ErmProblem<'_> {
    type Param = Theta;
    type Output = Cost;

    /// # Errors
    /// - `ErmError::NonFiniteObjective` if the objective is NaN or ±∞.
    /// - Any shape or configuration error from the model or loss.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let paras = self.layout.unflatten(theta)?;
        let value = self.loss.objective(self.model, &paras, self.x, self.y)?;
        if !value.is_finite() {
            return Err(ErmError::NonFiniteObjective { value }.into());
        }
        Ok(value)
    }
}

impl Gradient for ErmProblem<'_> {
    type Param = Theta;
    type Gradient = Grad;

    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let paras = self.layout.unflatten(theta)?;
        match self.loss.objective_gradient(self.model, &paras, self.x, self.y) {
            Ok(bundle) => {
                let g = self.layout.flatten(&bundle)?;
                validate_grad(&g, theta.len())?;
                Ok(g)
            }
            Err(ErmError::NotImplemented { .. }) => self.finite_difference(theta),
            Err(e) => Err(e.into()),
        }
    }
}

/// Forward-difference gradient with error capture.
///
/// # Errors
/// Returns the first error raised inside `func`, or a validation error for
/// the resulting gradient.
fn run_forward_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> Result<Grad, Error> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        losses::{dro::DroCr, quadratic::Quadratic},
        models::{
            attach_auxiliary,
            linear::{LinearRegression, WEIGHTS},
        },
    };
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover the analytic and finite-difference gradient paths of
    // the adapter against each other and against closed forms.
    // -------------------------------------------------------------------------

    fn model() -> LinearRegression {
        let mut rng = StdRng::seed_from_u64(0);
        let init = [(WEIGHTS.to_string(), array![[0.5]].into_dyn())].into_iter().collect();
        LinearRegression::new(1, 1, false, Some(init), &mut rng).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify the cost and analytic gradient for mean quadratic loss.
    //
    // Given
    // -----
    // - x = [[1], [2]], y = [[1], [2]], w = 0.5.
    //
    // Expect
    // ------
    // - cost = mean(r²/2) with r = [−0.5, −1], i.e. 0.3125.
    // - gradient = mean(r·x) = −1.25, matching central differences.
    fn analytic_gradient_matches_closed_form_and_fd() {
        // Arrange
        let model = model();
        let loss = Quadratic::new();
        let x = array![[1.0], [2.0]].into_dyn();
        let y = array![[1.0], [2.0]].into_dyn();
        let layout = ParamLayout::of(model.paras());
        let problem = ErmProblem::new(&model, &loss, &x, &y, &layout);
        let theta = layout.flatten(model.paras()).unwrap();

        // Act
        let cost = problem.cost(&theta).unwrap();
        let grad = problem.gradient(&theta).unwrap();
        let fd = problem.finite_difference(&theta).unwrap();

        // Assert
        assert_abs_diff_eq!(cost, 0.3125, epsilon = 1e-12);
        assert_abs_diff_eq!(grad[0], -1.25, epsilon = 1e-12);
        assert_abs_diff_eq!(fd[0], grad[0], epsilon = 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a loss without an analytic objective gradient falls back to
    // finite differences over every parameter, auxiliary ones included.
    //
    // Given
    // -----
    // - DRO-CR (bound 0, shape 2) over quadratic loss with theta attached.
    //
    // Expect
    // ------
    // - A finite gradient with one entry per flattened parameter.
    fn missing_objective_gradient_uses_finite_differences() {
        let mut model = model();
        let loss = DroCr::new(Box::new(Quadratic::new()), 0.0, 2.0).unwrap();
        attach_auxiliary(&mut model, &loss).unwrap();
        let x = array![[1.0], [2.0], [3.0]].into_dyn();
        let y = array![[2.0], [1.0], [0.0]].into_dyn();
        let layout = ParamLayout::of(model.paras());
        let problem = ErmProblem::new(&model, &loss, &x, &y, &layout);
        let theta = layout.flatten(model.paras()).unwrap();

        let grad = problem.gradient(&theta).unwrap();

        assert_eq!(grad.len(), 2);
        assert!(grad.iter().all(|v| v.is_finite()));
    }
}
