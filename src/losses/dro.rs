//! Distributionally robust loss under a Cressie–Read divergence ball.
//!
//! For shape `c > 1` let `c* = c / (c − 1)`. With shift parameter `theta`
//! the per-example surrogate is `theta + clip(l − theta, 0, ∞)^{c*}`, and the
//! population objective (the dual of the DRO problem with divergence bound
//! `bound`) is
//!
//! `theta + (1 + c(c − 1)·bound)^{1/c} · mean(clip(l − theta, 0, ∞)^{c*})^{1/c*}`.
use crate::{
    config::errors::ConfigError,
    errors::{ErmError, ErmResult},
    losses::traits::{
        Loss, check_loss_values, ensure_fresh_auxiliary, insert_auxiliary_gradient, mean_value,
        rescale_base, scalar_param,
    },
    models::traits::Model,
    tensor::types::{GradBundle, ParamSet, Tensor},
};

/// Auxiliary parameter name of the DRO shift.
pub const DRO_SHIFT: &str = "theta";

pub struct DroCr {
    base: Box<dyn Loss>,
    bound: f64,
    shape: f64,
    theta_init: f64,
}

impl DroCr {
    /// # Errors
    /// - `ConfigError::InvalidHyperparameter` unless `shape > 1` and
    ///   `bound >= 0` (both finite).
    /// - `ConfigError::DuplicateParameter` if `base` already uses `theta`.
    pub fn new(base: Box<dyn Loss>, bound: f64, shape: f64) -> ErmResult<Self> {
        if !(shape.is_finite() && shape > 1.0) {
            return Err(ConfigError::invalid("shape", shape, "must be finite and > 1").into());
        }
        if !(bound.is_finite() && bound >= 0.0) {
            return Err(ConfigError::invalid("bound", bound, "must be finite and >= 0").into());
        }
        ensure_fresh_auxiliary(base.as_ref(), DRO_SHIFT)?;
        Ok(Self { base, bound, shape, theta_init: 0.0 })
    }

    pub fn with_shift_init(mut self, theta_init: f64) -> Self {
        self.theta_init = theta_init;
        self
    }

    fn cstar(&self) -> f64 {
        self.shape / (self.shape - 1.0)
    }

    fn base_values(
        &self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor,
    ) -> ErmResult<(Tensor, f64)> {
        let losses = self.base.value(model, paras, x, y)?;
        check_loss_values(&losses, y)?;
        let theta = scalar_param(paras, DRO_SHIFT)?;
        Ok((losses, theta))
    }
}

impl Loss for DroCr {
    fn name(&self) -> String {
        format!("DRO_CR x {}", self.base.name())
    }

    fn value(&self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor) -> ErmResult<Tensor> {
        let (losses, theta) = self.base_values(model, paras, x, y)?;
        let cstar = self.cstar();
        Ok(losses.mapv(|l| theta + (l - theta).max(0.0).powf(cstar)))
    }

    fn gradient(
        &self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor,
    ) -> ErmResult<GradBundle> {
        let (losses, theta) = self.base_values(model, paras, x, y)?;
        let cstar = self.cstar();
        let coeffs = losses.mapv(|l| {
            if l >= theta { cstar * (l - theta).max(0.0).powf(cstar - 1.0) } else { 0.0 }
        });

        let mut bundle = rescale_base(self.base.gradient(model, paras, x, y)?, &coeffs)?;
        let dtheta = coeffs.mapv(|c| 1.0 - c);
        insert_auxiliary_gradient(&mut bundle, paras, DRO_SHIFT, dtheta)?;
        Ok(bundle)
    }

    fn auxiliary(&self) -> Vec<(String, f64)> {
        let mut aux = self.base.auxiliary();
        aux.push((DRO_SHIFT.to_string(), self.theta_init));
        aux
    }

    fn objective(&self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor) -> ErmResult<f64> {
        let (losses, theta) = self.base_values(model, paras, x, y)?;
        let cstar = self.cstar();
        let scale = (1.0 + self.shape * (self.shape - 1.0) * self.bound).powf(1.0 / self.shape);
        let excess = losses.mapv(|l| (l - theta).max(0.0).powf(cstar));
        Ok(theta + scale * mean_value(&excess)?.powf(1.0 / cstar))
    }

    fn objective_gradient(
        &self, _model: &dyn Model, _paras: &ParamSet, _x: &Tensor, _y: &Tensor,
    ) -> ErmResult<GradBundle> {
        Err(ErmError::not_implemented(format!("objective gradient of '{}'", self.name())))
    }
}
