//! Conditional value at risk over a base loss.
//!
//! With risk level `alpha ∈ (0, 1]` and threshold parameter `v`, the
//! per-example value is `v + clip(l − v, 0, ∞) / alpha`. Minimizing its mean
//! jointly over the model and `v` yields the CVaR of the base loss at the
//! `1 − alpha` quantile; `alpha = 1` recovers the base loss whenever `v` sits
//! below every loss value.
use crate::{
    config::errors::ConfigError,
    errors::ErmResult,
    losses::traits::{
        Loss, check_loss_values, ensure_fresh_auxiliary, insert_auxiliary_gradient, rescale_base,
        scalar_param,
    },
    models::traits::Model,
    tensor::types::{GradBundle, ParamSet, Tensor},
};

/// Auxiliary parameter name of the CVaR threshold.
pub const CVAR_THRESHOLD: &str = "v";

pub struct CVaR {
    base: Box<dyn Loss>,
    alpha: f64,
    v_init: f64,
}

impl CVaR {
    /// # Errors
    /// - `ConfigError::InvalidHyperparameter` unless `0 < alpha <= 1`.
    /// - `ConfigError::DuplicateParameter` if `base` already uses `v`.
    pub fn new(base: Box<dyn Loss>, alpha: f64) -> ErmResult<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(ConfigError::invalid("alpha", alpha, "must lie in (0, 1]").into());
        }
        ensure_fresh_auxiliary(base.as_ref(), CVAR_THRESHOLD)?;
        Ok(Self { base, alpha, v_init: 0.0 })
    }

    /// Initial value reported for `v` by [`Loss::auxiliary`].
    pub fn with_threshold_init(mut self, v_init: f64) -> Self {
        self.v_init = v_init;
        self
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    fn base_values(
        &self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor,
    ) -> ErmResult<(Tensor, f64)> {
        let losses = self.base.value(model, paras, x, y)?;
        check_loss_values(&losses, y)?;
        let v = scalar_param(paras, CVAR_THRESHOLD)?;
        Ok((losses, v))
    }
}

impl Loss for CVaR {
    fn name(&self) -> String {
        format!("CVaR x {}", self.base.name())
    }

    fn value(&self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor) -> ErmResult<Tensor> {
        let (losses, v) = self.base_values(model, paras, x, y)?;
        let alpha = self.alpha;
        Ok(losses.mapv(|l| v + (l - v).max(0.0) / alpha))
    }

    fn gradient(
        &self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor,
    ) -> ErmResult<GradBundle> {
        let (losses, v) = self.base_values(model, paras, x, y)?;
        let alpha = self.alpha;
        let exceeds = losses.mapv(|l| if l > v { 1.0 } else { 0.0 });

        let mut bundle = rescale_base(self.base.gradient(model, paras, x, y)?, &(&exceeds / alpha))?;
        let dv = exceeds.mapv(|e| if e > 0.0 { 1.0 - 1.0 / alpha } else { 1.0 });
        insert_auxiliary_gradient(&mut bundle, paras, CVAR_THRESHOLD, dv)?;
        Ok(bundle)
    }

    fn auxiliary(&self) -> Vec<(String, f64)> {
        let mut aux = self.base.auxiliary();
        aux.push((CVAR_THRESHOLD.to_string(), self.v_init));
        aux
    }
}
