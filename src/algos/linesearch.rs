//! algos::linesearch — the generic "direction, then step" update.
//!
//! Purpose
//! -------
//! Drive a model's parameters with any [`DirectionRule`]: each update asks
//! the rule for a per-parameter direction and per-parameter step sizes, checks
//! them against the model, then applies `p += step[p] · direction[p]` in
//! place.
//!
//! Key behaviors
//! -------------
//! - [`apply_direction`] validates every parameter before touching any of them,
//!   so a failed update leaves the parameter set unchanged.
//! - A direction carrying NaN or ±∞ is skipped with a `warn!` event instead of
//!   being written into the parameters.
//! - [`LineSearch`] implements [`Algorithm`] and `Iterator`; the iterator
//!   yields the number of completed updates and ends when the stop flag is
//!   consumed.
//!
//! Invariants & assumptions
//! ------------------------
//! - The direction bundle covers every parameter of the model, including loss
//!   auxiliary parameters attached with `attach_auxiliary`.
//! - Shapes must match exactly; the only reshaping happens inside direction
//!   rules via `tensor::shapes::squeeze_leading`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the all-or-nothing update, missing entries, the
//!   extra-leading-axis shape error and the non-finite skip.
use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::{
    algos::traits::{Algorithm, RunState, StopFlag},
    config::errors::{ConfigError, ConfigResult},
    errors::ErmResult,
    losses::traits::Loss,
    models::traits::Model,
    tensor::{
        errors::ShapeError,
        shapes::all_finite,
        types::{GradBundle, ParamSet, StepSizes, Tensor},
    },
};

/// Default uniform step coefficient.
pub const DEFAULT_STEP_COEF: f64 = 0.01;

/// Produces update directions and step sizes for a line search.
pub trait DirectionRule {
    fn name(&self) -> &str;

    /// One direction tensor per model parameter, shaped like the parameter.
    fn new_direction(
        &mut self, model: &dyn Model, loss: &dyn Loss, x: &Tensor, y: &Tensor,
    ) -> ErmResult<GradBundle>;

    /// One step size per model parameter.
    fn step_size(
        &mut self, direction: &GradBundle, model: &dyn Model, loss: &dyn Loss, x: &Tensor,
        y: &Tensor,
    ) -> ErmResult<StepSizes>;
}

impl<D: DirectionRule + ?Sized> DirectionRule for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn new_direction(
        &mut self, model: &dyn Model, loss: &dyn Loss, x: &Tensor, y: &Tensor,
    ) -> ErmResult<GradBundle> {
        (**self).new_direction(model, loss, x, y)
    }

    fn step_size(
        &mut self, direction: &GradBundle, model: &dyn Model, loss: &dyn Loss, x: &Tensor,
        y: &Tensor,
    ) -> ErmResult<StepSizes> {
        (**self).step_size(direction, model, loss, x, y)
    }
}

/// Fixed step coefficients: one uniform value with optional per-parameter
/// overrides. Constant across iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct StepCoefs {
    uniform: f64,
    overrides: BTreeMap<String, f64>,
}

impl StepCoefs {
    /// # Errors
    /// - `ConfigError::InvalidHyperparameter` unless `uniform` is finite and
    ///   positive.
    pub fn new(uniform: f64) -> ConfigResult<Self> {
        verify_step(uniform)?;
        Ok(Self { uniform, overrides: BTreeMap::new() })
    }

    /// Use `coef` for parameter `name` instead of the uniform value.
    pub fn with_override(mut self, name: &str, coef: f64) -> ConfigResult<Self> {
        verify_step(coef)?;
        self.overrides.insert(name.to_string(), coef);
        Ok(self)
    }

    pub fn uniform(&self) -> f64 {
        self.uniform
    }

    pub fn get(&self, name: &str) -> f64 {
        self.overrides.get(name).copied().unwrap_or(self.uniform)
    }

    /// Step sizes for every parameter in `paras`.
    pub fn resolve(&self, paras: &ParamSet) -> StepSizes {
        paras.keys().map(|name| (name.clone(), self.get(name))).collect()
    }
}

impl Default for StepCoefs {
    fn default() -> Self {
        Self { uniform: DEFAULT_STEP_COEF, overrides: BTreeMap::new() }
    }
}

fn verify_step(coef: f64) -> ConfigResult<()> {
    if !coef.is_finite() || coef <= 0.0 {
        return Err(ConfigError::invalid("step_coef", coef, "must be finite and > 0"));
    }
    Ok(())
}

/// Apply `p += step[p] · direction[p]` to every parameter in `paras`.
///
/// Returns `Ok(true)` when the update was applied and `Ok(false)` when it was
/// skipped because a direction or step was not finite.
///
/// # Errors
/// - `ConfigError::MissingParameter` if a parameter has no direction or step.
/// - `ShapeError::DirectionMismatch` if a direction's shape differs from its
///   parameter's.
///
/// On error nothing has been modified.
pub fn apply_direction(
    paras: &mut ParamSet, direction: &GradBundle, steps: &StepSizes,
) -> ErmResult<bool> {
    let mut finite = true;
    for (name, p) in paras.iter() {
        let d = direction.get(name).ok_or_else(|| ConfigError::missing_parameter(name))?;
        let step = steps.get(name).ok_or_else(|| ConfigError::missing_parameter(name))?;
        if d.shape() != p.shape() {
            return Err(ShapeError::DirectionMismatch {
                name: name.clone(),
                direction: d.shape().to_vec(),
                param: p.shape().to_vec(),
            }
            .into());
        }
        finite &= step.is_finite() && all_finite(d);
    }
    if !finite {
        warn!("non-finite update direction or step; skipping update");
        return Ok(false);
    }
    for (name, p) in paras.iter_mut() {
        p.scaled_add(steps[name], &direction[name]);
    }
    Ok(true)
}

/// Line-search driver over a model and loss.
pub struct LineSearch<'a, D: DirectionRule> {
    name: String,
    model: &'a mut dyn Model,
    loss: &'a dyn Loss,
    rule: D,
    stop: StopFlag,
    steps_taken: usize,
}

impl<'a, D: DirectionRule> LineSearch<'a, D> {
    pub fn new(model: &'a mut dyn Model, loss: &'a dyn Loss, rule: D) -> Self {
        let name = rule.name().to_string();
        Self { name, model, loss, rule, stop: StopFlag::new(), steps_taken: 0 }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn model(&self) -> &dyn Model {
        &*self.model
    }

    pub fn loss(&self) -> &dyn Loss {
        self.loss
    }

    pub fn rule(&self) -> &D {
        &self.rule
    }

    /// Number of updates actually applied.
    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }
}

impl<'a, D: DirectionRule> Algorithm for LineSearch<'a, D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self, x: &Tensor, y: &Tensor) -> ErmResult<()> {
        let direction = self.rule.new_direction(&*self.model, self.loss, x, y)?;
        let steps = self.rule.step_size(&direction, &*self.model, self.loss, x, y)?;
        if apply_direction(self.model.paras_mut(), &direction, &steps)? {
            self.steps_taken += 1;
            debug!(algo = %self.name, step = self.steps_taken, sizes = ?steps, "line-search update");
        }
        Ok(())
    }

    fn check(&mut self, cond: bool) {
        self.stop.check(cond);
    }

    fn state(&self) -> RunState {
        self.stop.state()
    }
}

impl<'a, D: DirectionRule> Iterator for LineSearch<'a, D> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.stop.advance() { Some(self.steps_taken) } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErmError;
    use ndarray::{ArrayD, IxDyn};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover `apply_direction` (shape checks, missing entries,
    // all-or-nothing semantics, non-finite skip) and `StepCoefs`. Full
    // line-search runs are covered by the direction-rule modules and the
    // integration tests.
    // -------------------------------------------------------------------------

    fn params() -> ParamSet {
        [
            ("a".to_string(), ArrayD::from_elem(IxDyn(&[2, 1]), 1.0)),
            ("b".to_string(), ArrayD::from_elem(IxDyn(&[1, 1]), 0.0)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    // Purpose
    // -------
    // Verify the additive update with per-parameter step sizes.
    //
    // Given
    // -----
    // - a = [[1], [1]], b = [[0]]; directions of ones; steps a: 0.5, b: 2.
    //
    // Expect
    // ------
    // - a = [[1.5], [1.5]], b = [[2]] and the call reports the update applied.
    fn applies_scaled_directions() {
        // Arrange
        let mut paras = params();
        let direction: GradBundle =
            paras.iter().map(|(k, v)| (k.clone(), Tensor::ones(v.raw_dim()))).collect();
        let steps = StepCoefs::new(0.5).unwrap().with_override("b", 2.0).unwrap().resolve(&paras);

        // Act
        let applied = apply_direction(&mut paras, &direction, &steps).unwrap();

        // Assert
        assert!(applied);
        assert!(paras["a"].iter().all(|&v| v == 1.5));
        assert_eq!(paras["b"][[0, 0]], 2.0);
    }

    #[test]
    // Purpose
    // -------
    // A direction with one extra leading axis of length k > 1 is a shape
    // error and leaves every parameter untouched.
    //
    // Given
    // -----
    // - Direction for "a" of shape (3, 2, 1); "b" well-formed and listed
    //   before "a" would be processed.
    //
    // Expect
    // ------
    // - `ShapeError::DirectionMismatch`; `a` and `b` keep their values.
    fn extra_leading_axis_is_rejected_without_side_effects() {
        // Arrange
        let mut paras = params();
        let before = paras.clone();
        let mut direction = GradBundle::new();
        direction.insert("a".to_string(), Tensor::ones(IxDyn(&[3, 2, 1])));
        direction.insert("b".to_string(), Tensor::ones(IxDyn(&[1, 1])));
        let steps = StepCoefs::default().resolve(&paras);

        // Act
        let err = apply_direction(&mut paras, &direction, &steps).unwrap_err();

        // Assert
        assert!(matches!(err, ErmError::Shape(ShapeError::DirectionMismatch { .. })));
        assert_eq!(paras, before);
    }

    #[test]
    // Purpose
    // -------
    // Missing direction entries are configuration errors.
    //
    // Given
    // -----
    // - A direction bundle lacking "b".
    //
    // Expect
    // ------
    // - `ConfigError::MissingParameter` naming "b".
    fn missing_direction_is_config_error() {
        let mut paras = params();
        let mut direction = GradBundle::new();
        direction.insert("a".to_string(), Tensor::ones(IxDyn(&[2, 1])));
        let steps = StepCoefs::default().resolve(&paras);

        let err = apply_direction(&mut paras, &direction, &steps).unwrap_err();

        assert_eq!(err, ErmError::Config(ConfigError::missing_parameter("b")));
    }

    #[test]
    // Purpose
    // -------
    // Non-finite directions are skipped rather than written.
    //
    // Given
    // -----
    // - Direction for "a" containing NaN.
    //
    // Expect
    // ------
    // - `Ok(false)` and unchanged parameters.
    fn non_finite_direction_is_skipped() {
        let mut paras = params();
        let before = paras.clone();
        let mut direction: GradBundle =
            paras.iter().map(|(k, v)| (k.clone(), Tensor::ones(v.raw_dim()))).collect();
        direction.get_mut("a").unwrap()[[0, 0]] = f64::NAN;
        let steps = StepCoefs::default().resolve(&paras);

        let applied = apply_direction(&mut paras, &direction, &steps).unwrap();

        assert!(!applied);
        assert_eq!(paras, before);
    }

    #[test]
    // Purpose
    // -------
    // Step coefficients must be finite and positive.
    //
    // Given
    // -----
    // - Uniform 0.0, and an override of NaN.
    //
    // Expect
    // ------
    // - Both are `InvalidHyperparameter`.
    fn step_coefs_are_validated() {
        assert!(matches!(StepCoefs::new(0.0), Err(ConfigError::InvalidHyperparameter { .. })));
        assert!(matches!(
            StepCoefs::new(0.1).unwrap().with_override("w", f64::NAN),
            Err(ConfigError::InvalidHyperparameter { .. })
        ));
    }
}
