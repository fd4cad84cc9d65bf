//! Exponentially tilted loss.
//!
//! Per-example value `exp(t·(l − s))`, where `s` is the batch maximum of the
//! base losses for `t >= 0` and the batch minimum for `t < 0`; the shift keeps
//! the exponent non-positive and only rescales the batch uniformly. The
//! population objective is the tilted risk `(1/t) · log mean exp(t·l)`,
//! evaluated as `(log mean exp(t·l − m) + m) / t` with `m = max(t·l)`.
use crate::{
    config::errors::ConfigError,
    errors::ErmResult,
    losses::traits::{Loss, check_loss_values, mean_gradient, mean_value, rescale_base},
    models::traits::Model,
    tensor::types::{GradBundle, ParamSet, Tensor},
};

pub struct Tilted {
    base: Box<dyn Loss>,
    tilt: f64,
}

impl Tilted {
    /// # Errors
    /// - `ConfigError::InvalidHyperparameter` if `tilt` is zero or not finite.
    pub fn new(base: Box<dyn Loss>, tilt: f64) -> ErmResult<Self> {
        if !tilt.is_finite() || tilt == 0.0 {
            return Err(ConfigError::invalid("tilt", tilt, "must be finite and non-zero").into());
        }
        Ok(Self { base, tilt })
    }

    pub fn tilt(&self) -> f64 {
        self.tilt
    }

    fn shift(&self, losses: &Tensor) -> f64 {
        if self.tilt >= 0.0 {
            losses.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        } else {
            losses.iter().copied().fold(f64::INFINITY, f64::min)
        }
    }

    fn tilted(&self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor) -> ErmResult<Tensor> {
        let losses = self.base.value(model, paras, x, y)?;
        check_loss_values(&losses, y)?;
        let s = self.shift(&losses);
        let t = self.tilt;
        Ok(losses.mapv(|l| (t * (l - s)).exp()))
    }
}

impl Loss for Tilted {
    fn name(&self) -> String {
        format!("Tilted x {}", self.base.name())
    }

    fn value(&self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor) -> ErmResult<Tensor> {
        self.tilted(model, paras, x, y)
    }

    fn gradient(
        &self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor,
    ) -> ErmResult<GradBundle> {
        let coeffs = self.tilted(model, paras, x, y)? * self.tilt;
        rescale_base(self.base.gradient(model, paras, x, y)?, &coeffs)
    }

    fn auxiliary(&self) -> Vec<(String, f64)> {
        self.base.auxiliary()
    }

    fn objective(&self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor) -> ErmResult<f64> {
        let losses = self.base.value(model, paras, x, y)?;
        check_loss_values(&losses, y)?;
        let t = self.tilt;
        let scaled = losses.mapv(|l| t * l);
        let m = scaled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean_exp = mean_value(&scaled.mapv(|u| (u - m).exp()))?;
        Ok((mean_exp.ln() + m) / t)
    }

    /// `mean(w·∇l) / mean(w)` with `w = exp(t·l − m)`.
    fn objective_gradient(
        &self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor,
    ) -> ErmResult<GradBundle> {
        let losses = self.base.value(model, paras, x, y)?;
        check_loss_values(&losses, y)?;
        let t = self.tilt;
        let m = losses.iter().map(|&l| t * l).fold(f64::NEG_INFINITY, f64::max);
        let weights = losses.mapv(|l| (t * l - m).exp());
        let norm = mean_value(&weights)?;
        let bundle = rescale_base(self.base.gradient(model, paras, x, y)?, &(weights / norm))?;
        mean_gradient(&bundle)
    }
}
