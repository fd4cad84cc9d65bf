//! Zero-one classification error.
//!
//! The model returns `(n, c)` class scores and targets are one-hot `(n, c)`.
//! The prediction is the first class attaining the row maximum; the value is
//! `1` when the predicted one-hot row differs from the target row. There is
//! no gradient.
use ndarray::{Array1, Axis};

use crate::{
    errors::{ErmError, ErmResult},
    losses::traits::{Loss, check_output_target},
    models::traits::Model,
    tensor::{
        linalg::onehot,
        types::{GradBundle, ParamSet, Tensor},
    },
};

#[derive(Debug, Clone, Default)]
pub struct ZeroOne;

impl ZeroOne {
    pub fn new() -> Self {
        ZeroOne
    }
}

fn argmax_rows(scores: &Tensor) -> Vec<usize> {
    scores
        .axis_iter(Axis(0))
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |(best, best_v), (j, &v)| {
                    if v > best_v { (j, v) } else { (best, best_v) }
                })
                .0
        })
        .collect()
}

impl Loss for ZeroOne {
    fn name(&self) -> String {
        "Zero-one".to_string()
    }

    fn value(&self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor) -> ErmResult<Tensor> {
        let scores = model.evaluate(paras, x)?;
        check_output_target(&scores, y)?;
        let predicted = onehot(&argmax_rows(&scores), Some(y.shape()[1]))?;
        let wrong = predicted
            .axis_iter(Axis(0))
            .zip(y.axis_iter(Axis(0)))
            .map(|(p, t)| if p.iter().zip(t.iter()).any(|(a, b)| a != b) { 1.0 } else { 0.0 })
            .collect::<Array1<f64>>();
        Ok(wrong.insert_axis(Axis(1)).into_dyn())
    }

    fn gradient(
        &self, _model: &dyn Model, _paras: &ParamSet, _x: &Tensor, _y: &Tensor,
    ) -> ErmResult<GradBundle> {
        Err(ErmError::not_implemented("gradient of the zero-one loss"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::linear::{LinearRegression, WEIGHTS};
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    // Purpose
    // -------
    // Verify misclassification indicators and the missing gradient.
    //
    // Given
    // -----
    // - Identity weights on two classes; X rows favour class 0 then class 1.
    // - Targets: class 0 then class 0.
    //
    // Expect
    // ------
    // - Values [[0], [1]]; `gradient` is NotImplemented.
    fn counts_mistakes_and_has_no_gradient() {
        // Arrange
        let mut rng = StdRng::seed_from_u64(0);
        let init =
            [(WEIGHTS.to_string(), array![[1.0, 0.0], [0.0, 1.0]].into_dyn())].into_iter().collect();
        let model = LinearRegression::new(2, 2, false, Some(init), &mut rng).unwrap();
        let x = array![[3.0, 1.0], [0.0, 2.0]].into_dyn();
        let y = array![[1.0, 0.0], [1.0, 0.0]].into_dyn();

        // Act
        let v = ZeroOne::new().value_current(&model, &x, &y).unwrap();
        let g = ZeroOne::new().gradient_current(&model, &x, &y);

        // Assert
        assert_eq!(v.iter().copied().collect::<Vec<_>>(), vec![0.0, 1.0]);
        assert!(matches!(g, Err(ErmError::NotImplemented { .. })));
    }
}
