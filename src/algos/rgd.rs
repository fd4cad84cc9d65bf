//! algos::rgd — robust gradient descent direction rules.
//!
//! Purpose
//! -------
//! Replace the batch mean of per-example gradients with a robust aggregate so
//! that a few heavy-tailed examples cannot dominate the update.
//!
//! Key behaviors
//! -------------
//! - [`RgdMest`]: coordinate-wise M-estimate of location. For each parameter
//!   with per-example gradients `g` of shape `(n, …)`:
//!   1. `s = sqrt(n / ln(1/δ)) · est_scale(g − mean(g))`,
//!   2. `direction = −est_loc(g, s)`, shape `(1, …)`,
//!   3. the leading singleton is squeezed to the parameter shape.
//!
//!   The configured `mest_thres` / `mest_iters` drive step 2 only. The scale
//!   solver in step 1 runs with the solver defaults unless
//!   [`RgdMest::with_scale_options`] says otherwise.
//! - [`RgdVecMedian`]: each parameter's gradients are treated as `n` points
//!   and aggregated with a vector median; `direction = −median`.
//! - Step sizes are fixed per parameter ([`StepCoefs`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - `δ ∈ (0, 1)`, checked in `new`.
//! - Any shape disagreement other than one leading singleton is a
//!   `ShapeError`, raised before the line search touches parameters.
use tracing::trace;

use crate::{
    algos::linesearch::{DirectionRule, StepCoefs},
    config::errors::{ConfigError, ConfigResult},
    errors::ErmResult,
    losses::traits::Loss,
    models::traits::Model,
    robust::{
        influence::Influence,
        mest::{MestOptions, ScaleEstimator, est_loc_fixedpt},
        vecmean::{MedianOptions, VecMedian},
    },
    tensor::{
        shapes::{batch_mean_keepdims, squeeze_leading},
        types::{GradBundle, StepSizes, Tensor},
    },
};

fn param_shape<'m>(model: &'m dyn Model, name: &str) -> ErmResult<&'m [usize]> {
    Ok(model
        .shapes()
        .get(name)
        .map(Vec::as_slice)
        .ok_or_else(|| ConfigError::missing_parameter(name))?)
}

/// Robust gradient descent via coordinate-wise M-estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct RgdMest {
    influence: Influence,
    scale: ScaleEstimator,
    delta: f64,
    mest: MestOptions,
    scale_opts: MestOptions,
    steps: StepCoefs,
}

impl RgdMest {
    /// # Errors
    /// - `ConfigError::InvalidHyperparameter` unless `0 < delta < 1`.
    pub fn new(
        influence: Influence, scale: ScaleEstimator, delta: f64, mest: MestOptions,
        steps: StepCoefs,
    ) -> ConfigResult<Self> {
        if !(delta > 0.0 && delta < 1.0) {
            return Err(ConfigError::invalid("delta", delta, "must lie in (0, 1)"));
        }
        Ok(Self { influence, scale, delta, mest, scale_opts: MestOptions::default(), steps })
    }

    /// Stopping rule for the scale step.
    pub fn with_scale_options(mut self, scale_opts: MestOptions) -> Self {
        self.scale_opts = scale_opts;
        self
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn mest_options(&self) -> &MestOptions {
        &self.mest
    }

    pub fn scale_options(&self) -> &MestOptions {
        &self.scale_opts
    }

    /// Confidence factor `sqrt(n / ln(1/δ))`.
    fn confidence_factor(&self, n: usize) -> f64 {
        (n as f64 / (1.0 / self.delta).ln()).sqrt()
    }

    /// Robust direction for one parameter's per-example gradients.
    pub fn aggregate(&self, grads: &Tensor, param_shape: &[usize], name: &str) -> ErmResult<Tensor> {
        let n = grads.shape().first().copied().unwrap_or(0);
        let centered = grads - &batch_mean_keepdims(grads, "robust gradient")?;
        let scale = self.scale.estimate(&centered, &self.scale_opts)? * self.confidence_factor(n);
        let influence = self.influence;
        let loc = est_loc_fixedpt(grads, &scale, |u| influence.apply(u), &self.mest)?;
        trace!(param = name, n, "M-estimated gradient location");
        Ok(squeeze_leading(-loc, param_shape, name)?)
    }
}

impl DirectionRule for RgdMest {
    fn name(&self) -> &str {
        "RGD_Mest"
    }

    fn new_direction(
        &mut self, model: &dyn Model, loss: &dyn Loss, x: &Tensor, y: &Tensor,
    ) -> ErmResult<GradBundle> {
        let grads = loss.gradient_current(model, x, y)?;
        let mut direction = GradBundle::new();
        for (name, g) in &grads {
            let shape = param_shape(model, name)?;
            direction.insert(name.clone(), self.aggregate(g, shape, name)?);
        }
        Ok(direction)
    }

    fn step_size(
        &mut self, _direction: &GradBundle, model: &dyn Model, _loss: &dyn Loss, _x: &Tensor,
        _y: &Tensor,
    ) -> ErmResult<StepSizes> {
        Ok(self.steps.resolve(model.paras()))
    }
}

/// Robust gradient descent via vector medians of per-example gradients.
#[derive(Debug, Clone, PartialEq)]
pub struct RgdVecMedian {
    median: VecMedian,
    opts: MedianOptions,
    steps: StepCoefs,
}

impl RgdVecMedian {
    pub fn new(median: VecMedian, opts: MedianOptions, steps: StepCoefs) -> Self {
        Self { median, opts, steps }
    }
}

impl DirectionRule for RgdVecMedian {
    fn name(&self) -> &str {
        "RGD_VecMedian"
    }

    fn new_direction(
        &mut self, model: &dyn Model, loss: &dyn Loss, x: &Tensor, y: &Tensor,
    ) -> ErmResult<GradBundle> {
        let grads = loss.gradient_current(model, x, y)?;
        let mut direction = GradBundle::new();
        for (name, g) in &grads {
            let shape = param_shape(model, name)?;
            let med = self.median.estimate(g, &self.opts)?;
            direction.insert(name.clone(), squeeze_leading(-med, shape, name)?);
        }
        Ok(direction)
    }

    fn step_size(
        &mut self, _direction: &GradBundle, model: &dyn Model, _loss: &dyn Loss, _x: &Tensor,
        _y: &Tensor,
    ) -> ErmResult<StepSizes> {
        Ok(self.steps.resolve(model.paras()))
    }
}
