//! Plain batch gradient descent on the empirical risk.
use crate::{
    algos::linesearch::{DirectionRule, StepCoefs},
    errors::ErmResult,
    losses::traits::{Loss, mean_gradient},
    models::traits::Model,
    tensor::types::{GradBundle, StepSizes, Tensor},
};

/// Direction `−mean_i ∇ℓ_i` per parameter, with fixed step coefficients.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GdErm {
    steps: StepCoefs,
}

impl GdErm {
    pub fn new(steps: StepCoefs) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &StepCoefs {
        &self.steps
    }
}

impl DirectionRule for GdErm {
    fn name(&self) -> &str {
        "GD_ERM"
    }

    fn new_direction(
        &mut self, model: &dyn Model, loss: &dyn Loss, x: &Tensor, y: &Tensor,
    ) -> ErmResult<GradBundle> {
        let grads = loss.gradient_current(model, x, y)?;
        let mut direction = mean_gradient(&grads)?;
        direction.values_mut().for_each(|d| d.mapv_inplace(|v| -v));
        Ok(direction)
    }

    fn step_size(
        &mut self, _direction: &GradBundle, model: &dyn Model, _loss: &dyn Loss, _x: &Tensor,
        _y: &Tensor,
    ) -> ErmResult<StepSizes> {
        Ok(self.steps.resolve(model.paras()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        algos::{linesearch::LineSearch, traits::Algorithm},
        losses::quadratic::Quadratic,
        models::linear::LinearRegression,
        tensor::types::ParamSet,
    };
    use approx::assert_abs_diff_eq;
    use ndarray::{IxDyn, array};
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    // Purpose
    // -------
    // Verify one GD step on a scalar least-squares problem by hand.
    //
    // Given
    // -----
    // - x = [[1], [2]], y = [[1], [2]], w = [[0]], no intercept, step 0.1.
    //
    // Expect
    // ------
    // - Mean gradient of (xw − y)²/2 is mean(x(xw − y)) = −2.5, so
    //   w becomes 0.25.
    fn single_step_matches_hand_computation() {
        // Arrange
        let mut rng = StdRng::seed_from_u64(0);
        let init: ParamSet =
            [("w".to_string(), Tensor::zeros(IxDyn(&[1, 1])))].into_iter().collect();
        let mut model = LinearRegression::new(1, 1, false, Some(init), &mut rng).unwrap();
        let loss = Quadratic;
        let x = array![[1.0], [2.0]].into_dyn();
        let y = array![[1.0], [2.0]].into_dyn();
        let rule = GdErm::new(StepCoefs::new(0.1).unwrap());
        let mut algo = LineSearch::new(&mut model, &loss, rule);

        // Act
        algo.update(&x, &y).unwrap();

        // Assert
        assert_eq!(algo.steps_taken(), 1);
        assert_abs_diff_eq!(algo.model().paras()["w"][[0, 0]], 0.25, epsilon = 1e-12);
    }
}
