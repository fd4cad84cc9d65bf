//! Absolute penalty `|f(x) − y|` for single-output models.
use crate::{
    errors::ErmResult,
    losses::traits::{Loss, check_output_target, compose_with_model},
    models::traits::Model,
    tensor::{
        errors::ShapeError,
        shapes::sign,
        types::{GradBundle, ParamSet, Tensor},
    },
};

#[derive(Debug, Clone, Default)]
pub struct Absolute;

impl Absolute {
    pub fn new() -> Self {
        Absolute
    }

    fn residuals(model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor) -> ErmResult<Tensor> {
        let output = model.evaluate(paras, x)?;
        check_output_target(&output, y)?;
        if output.shape()[1] != 1 {
            return Err(ShapeError::OutputTargetMismatch {
                output: output.shape().to_vec(),
                target: y.shape().to_vec(),
                reason: "absolute loss supports single-output models only",
            }
            .into());
        }
        Ok(output - y)
    }
}

impl Loss for Absolute {
    fn name(&self) -> String {
        "Absolute".to_string()
    }

    fn value(&self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor) -> ErmResult<Tensor> {
        Ok(Self::residuals(model, paras, x, y)?.mapv(f64::abs))
    }

    /// Sub-gradient `sign(f(x) − y) · ∂f`, with `sign(0) = 0`.
    fn gradient(
        &self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor,
    ) -> ErmResult<GradBundle> {
        let signs = Self::residuals(model, paras, x, y)?.mapv(sign);
        compose_with_model(model, paras, x, &signs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::ErmError,
        models::linear::{LinearRegression, WEIGHTS},
    };
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    // Purpose
    // -------
    // Verify values and the three-valued sub-gradient.
    //
    // Given
    // -----
    // - w = [[1]], X = [[2], [1], [0]], y = [[1], [1], [3]].
    //   Residuals are [1, 0, -3].
    //
    // Expect
    // ------
    // - Values [1, 0, 3]; gradient slices [2, 0, 0] (x_i · sign(r_i)).
    fn value_and_subgradient() {
        // Arrange
        let mut rng = StdRng::seed_from_u64(0);
        let init = [(WEIGHTS.to_string(), array![[1.0]].into_dyn())].into_iter().collect();
        let model = LinearRegression::new(1, 1, false, Some(init), &mut rng).unwrap();
        let x = array![[2.0], [1.0], [0.0]].into_dyn();
        let y = array![[1.0], [1.0], [3.0]].into_dyn();

        // Act
        let values = Absolute::new().value_current(&model, &x, &y).unwrap();
        let grads = Absolute::new().gradient_current(&model, &x, &y).unwrap();

        // Assert
        assert_eq!(values.iter().copied().collect::<Vec<_>>(), vec![1.0, 0.0, 3.0]);
        let g: Vec<f64> = grads[WEIGHTS].iter().copied().collect();
        assert_eq!(g, vec![2.0, 0.0, 0.0]);
    }

    #[test]
    // Purpose
    // -------
    // Ensure multi-output models are refused.
    //
    // Given
    // -----
    // - A (1, 2) linear model and (n, 2) targets.
    //
    // Expect
    // ------
    // - `ErmError::Shape`.
    fn rejects_multi_output() {
        let mut rng = StdRng::seed_from_u64(0);
        let model = LinearRegression::new(1, 2, false, None, &mut rng).unwrap();
        let x = array![[1.0]].into_dyn();
        let y = array![[0.0, 0.0]].into_dyn();

        let err = Absolute::new().value_current(&model, &x, &y).unwrap_err();

        assert!(matches!(err, ErmError::Shape(_)));
    }
}
