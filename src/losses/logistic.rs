//! Logistic losses.
//!
//! - [`LogisticBinary`]: targets `(n, 1)` in `{−1, +1}`, model returns one
//!   unnormalized score per example; value `log(1 + exp(−y·a))`.
//! - [`Logistic`]: one-hot targets `(n, c)`, model returns `c` unnormalized
//!   scores; value `−⟨a, y⟩ + logsumexp(a)`, derivative `softmax(a) − y`.
//!
//! Both are evaluated in overflow-safe forms (branching on the sign of the
//! margin, subtracting the row max before exponentiating).
use ndarray::{Axis, Zip};

use crate::{
    errors::ErmResult,
    losses::traits::{Loss, check_output_target, compose_with_model},
    models::traits::Model,
    tensor::types::{GradBundle, ParamSet, Tensor},
};

#[derive(Debug, Clone, Default)]
pub struct LogisticBinary;

impl LogisticBinary {
    pub fn new() -> Self {
        LogisticBinary
    }

    fn scores(model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor) -> ErmResult<Tensor> {
        let scores = model.evaluate(paras, x)?;
        check_output_target(&scores, y)?;
        Ok(scores)
    }
}

/// `log(1 + exp(−m))` without overflow.
fn softplus_neg(m: f64) -> f64 {
    if m >= 0.0 { (-m).exp().ln_1p() } else { m.exp().ln_1p() - m }
}

/// `exp(−m) / (1 + exp(−m))` without overflow.
fn sigmoid_neg(m: f64) -> f64 {
    if m >= 0.0 {
        let e = (-m).exp();
        e / (1.0 + e)
    } else {
        1.0 / (1.0 + m.exp())
    }
}

impl Loss for LogisticBinary {
    fn name(&self) -> String {
        "Logistic (binary)".to_string()
    }

    fn value(&self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor) -> ErmResult<Tensor> {
        let scores = Self::scores(model, paras, x, y)?;
        let mut out = scores * y;
        out.mapv_inplace(softplus_neg);
        Ok(out)
    }

    fn gradient(
        &self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor,
    ) -> ErmResult<GradBundle> {
        let scores = Self::scores(model, paras, x, y)?;
        let mut coeffs = scores;
        Zip::from(&mut coeffs).and(y).for_each(|a, &label| {
            *a = -label * sigmoid_neg(*a * label);
        });
        compose_with_model(model, paras, x, &coeffs)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Logistic;

impl Logistic {
    pub fn new() -> Self {
        Logistic
    }

    fn scores(model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor) -> ErmResult<Tensor> {
        let scores = model.evaluate(paras, x)?;
        check_output_target(&scores, y)?;
        Ok(scores)
    }
}

fn row_max(a: &Tensor) -> Tensor {
    a.map_axis(Axis(1), |row| row.iter().copied().fold(f64::NEG_INFINITY, f64::max))
        .insert_axis(Axis(1))
}

impl Loss for Logistic {
    fn name(&self) -> String {
        "Logistic".to_string()
    }

    fn value(&self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor) -> ErmResult<Tensor> {
        let scores = Self::scores(model, paras, x, y)?;
        let maxes = row_max(&scores);
        let inner = (&scores * y).sum_axis(Axis(1)).insert_axis(Axis(1));
        let lse = (&scores - &maxes).mapv(f64::exp).sum_axis(Axis(1)).insert_axis(Axis(1)).mapv(f64::ln)
            + &maxes;
        Ok(lse - inner)
    }

    fn gradient(
        &self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor,
    ) -> ErmResult<GradBundle> {
        let scores = Self::scores(model, paras, x, y)?;
        let maxes = row_max(&scores);
        let mut probs = (&scores - &maxes).mapv(f64::exp);
        let totals = probs.sum_axis(Axis(1)).insert_axis(Axis(1));
        probs /= &totals;
        probs -= y;
        compose_with_model(model, paras, x, &probs)
    }
}
