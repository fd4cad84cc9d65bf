//! Quadratic penalty `‖f(x) − y‖² / 2`.
//!
//! With `k` outputs the per-example value sums the `k` squared residuals; the
//! per-output derivative is the residual itself.
use ndarray::Axis;

use crate::{
    errors::ErmResult,
    losses::traits::{Loss, check_output_target, compose_with_model},
    models::traits::Model,
    tensor::types::{GradBundle, ParamSet, Tensor},
};

#[derive(Debug, Clone, Default)]
pub struct Quadratic;

impl Quadratic {
    pub fn new() -> Self {
        Quadratic
    }

    fn residuals(model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor) -> ErmResult<Tensor> {
        let output = model.evaluate(paras, x)?;
        check_output_target(&output, y)?;
        Ok(output - y)
    }
}

impl Loss for Quadratic {
    fn name(&self) -> String {
        "Quadratic".to_string()
    }

    fn value(&self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor) -> ErmResult<Tensor> {
        let r = Self::residuals(model, paras, x, y)?;
        Ok(r.mapv(|v| v * v / 2.0).sum_axis(Axis(1)).insert_axis(Axis(1)))
    }

    fn gradient(
        &self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor,
    ) -> ErmResult<GradBundle> {
        let r = Self::residuals(model, paras, x, y)?;
        compose_with_model(model, paras, x, &r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::ErmError,
        models::linear::{LinearRegression, WEIGHTS},
    };
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    fn model_with(w: Tensor) -> LinearRegression {
        let mut rng = StdRng::seed_from_u64(0);
        let init = [(WEIGHTS.to_string(), w)].into_iter().collect();
        LinearRegression::new(2, 1, false, Some(init), &mut rng).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify `value = (f(x) − y)² / 2` and `gradient = (f(x) − y) · ∂f` per
    // example.
    //
    // Given
    // -----
    // - w = [[1], [2]], X = [[1, 0], [1, 1]], y = [[0], [1]].
    //   Residuals are [1, 2].
    //
    // Expect
    // ------
    // - Values [[0.5], [2.0]].
    // - Gradient entry (2, 2, 1) equal to residual_i · x_i.
    fn value_and_gradient_match_closed_form() {
        // Arrange
        let model = model_with(array![[1.0], [2.0]].into_dyn());
        let x = array![[1.0, 0.0], [1.0, 1.0]].into_dyn();
        let y = array![[0.0], [1.0]].into_dyn();
        let loss = Quadratic::new();

        // Act
        let values = loss.value_current(&model, &x, &y).unwrap();
        let grads = loss.gradient_current(&model, &x, &y).unwrap();

        // Assert
        assert_eq!(values.shape(), &[2, 1]);
        assert_abs_diff_eq!(values[[0, 0]], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(values[[1, 0]], 2.0, epsilon = 1e-12);
        let g = &grads[WEIGHTS];
        assert_eq!(g.shape(), &[2, 2, 1]);
        assert_abs_diff_eq!(g[[0, 0, 0]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(g[[0, 1, 0]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(g[[1, 0, 0]], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(g[[1, 1, 0]], 2.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a target with the wrong number of examples is rejected before
    // any arithmetic.
    //
    // Given
    // -----
    // - Two inputs and three targets.
    //
    // Expect
    // ------
    // - `ErmError::Shape`.
    fn mismatched_target_is_shape_error() {
        let model = model_with(array![[1.0], [2.0]].into_dyn());
        let x = array![[1.0, 0.0], [1.0, 1.0]].into_dyn();
        let y = array![[0.0], [1.0], [2.0]].into_dyn();

        let err = Quadratic::new().value_current(&model, &x, &y).unwrap_err();

        assert!(matches!(err, ErmError::Shape(_)));
    }
}
