//! Binary classification margin `s · y`, optionally hinged at a threshold.
//!
//! Targets are `(n, 1)` in `{−1, +1}` and the model returns one score per
//! example. With `hinge` set, margins below `threshold` contribute zero value
//! and zero gradient.
use ndarray::Zip;

use crate::{
    errors::ErmResult,
    losses::traits::{Loss, check_output_target, compose_with_model},
    models::traits::Model,
    tensor::types::{GradBundle, ParamSet, Tensor},
};

#[derive(Debug, Clone)]
pub struct MarginBinary {
    hinge: bool,
    threshold: f64,
}

impl Default for MarginBinary {
    fn default() -> Self {
        Self { hinge: true, threshold: 0.0 }
    }
}

impl MarginBinary {
    pub fn new(hinge: bool, threshold: f64) -> Self {
        Self { hinge, threshold }
    }

    fn margins(model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor) -> ErmResult<Tensor> {
        let scores = model.evaluate(paras, x)?;
        check_output_target(&scores, y)?;
        Ok(scores * y)
    }
}

impl Loss for MarginBinary {
    fn name(&self) -> String {
        "Margin (binary)".to_string()
    }

    fn value(&self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor) -> ErmResult<Tensor> {
        let mut margins = Self::margins(model, paras, x, y)?;
        if self.hinge {
            let threshold = self.threshold;
            margins.mapv_inplace(|m| if m >= threshold { m } else { 0.0 });
        }
        Ok(margins)
    }

    fn gradient(
        &self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor,
    ) -> ErmResult<GradBundle> {
        let mut coeffs = Self::margins(model, paras, x, y)?;
        let (hinge, threshold) = (self.hinge, self.threshold);
        Zip::from(&mut coeffs).and(y).for_each(|c, &label| {
            *c = if !hinge || *c >= threshold { label } else { 0.0 };
        });
        compose_with_model(model, paras, x, &coeffs)
    }
}
