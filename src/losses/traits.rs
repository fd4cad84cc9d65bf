//! losses::traits — the `Loss` contract and the gradient-composition helpers
//! shared by base losses and risk-transform wrappers.
//!
//! Every loss evaluates a model at an explicit parameter set. The provided
//! `*_current` methods evaluate at the model's own parameters.
use crate::{
    config::errors::ConfigError,
    errors::ErmResult,
    models::traits::{Model, ParamStore},
    tensor::{
        errors::ShapeError,
        shapes::{batch_mean, expand_trailing, rescale_bundle, rescale_by_outputs},
        types::{GradBundle, ParamSet, Tensor},
    },
};

/// A per-example penalty composed with a model.
pub trait Loss {
    fn name(&self) -> String;

    /// Per-example loss values, shape `(n, 1)`.
    fn value(&self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor) -> ErmResult<Tensor>;

    /// Per-example gradient bundle: one entry per model parameter plus one per
    /// auxiliary parameter of this loss (and any it wraps).
    fn gradient(
        &self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor,
    ) -> ErmResult<GradBundle>;

    /// Auxiliary scalar parameters `(name, initial value)` this loss expects
    /// to find in the parameter set.
    fn auxiliary(&self) -> Vec<(String, f64)> {
        Vec::new()
    }

    /// Population objective over the batch. Defaults to the mean of
    /// [`Loss::value`].
    fn objective(&self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor) -> ErmResult<f64> {
        let values = self.value(model, paras, x, y)?;
        mean_value(&values)
    }

    /// Gradient of [`Loss::objective`] with respect to every parameter,
    /// shaped like the parameters. Defaults to the batch mean of
    /// [`Loss::gradient`], which is exact whenever the objective is the mean
    /// of the per-example values.
    fn objective_gradient(
        &self, model: &dyn Model, paras: &ParamSet, x: &Tensor, y: &Tensor,
    ) -> ErmResult<GradBundle> {
        mean_gradient(&self.gradient(model, paras, x, y)?)
    }

    fn value_current(&self, model: &dyn Model, x: &Tensor, y: &Tensor) -> ErmResult<Tensor> {
        self.value(model, model.paras(), x, y)
    }

    fn gradient_current(&self, model: &dyn Model, x: &Tensor, y: &Tensor) -> ErmResult<GradBundle> {
        self.gradient(model, model.paras(), x, y)
    }

    fn objective_current(&self, model: &dyn Model, x: &Tensor, y: &Tensor) -> ErmResult<f64> {
        self.objective(model, model.paras(), x, y)
    }
}

/// Mean of all loss values, refusing an empty batch.
pub fn mean_value(values: &Tensor) -> ErmResult<f64> {
    if values.is_empty() {
        return Err(ShapeError::EmptyBatch { what: "loss objective" }.into());
    }
    Ok(values.sum() / values.len() as f64)
}

/// Require model outputs and targets to agree in rank, batch size and column
/// count.
pub fn check_output_target(output: &Tensor, y: &Tensor) -> ErmResult<()> {
    let mismatch = |reason| ShapeError::OutputTargetMismatch {
        output: output.shape().to_vec(),
        target: y.shape().to_vec(),
        reason,
    };
    if output.ndim() != 2 || y.ndim() != 2 {
        return Err(mismatch("outputs and targets must both be (n, k)").into());
    }
    if output.shape()[0] != y.shape()[0] {
        return Err(mismatch("number of examples differs").into());
    }
    if output.shape()[1] != y.shape()[1] {
        return Err(mismatch("number of columns differs").into());
    }
    if output.shape()[0] == 0 {
        return Err(ShapeError::EmptyBatch { what: "loss inputs" }.into());
    }
    Ok(())
}

/// Require per-example loss values of shape `(n, 1)` matching the batch size
/// of `y`.
pub fn check_loss_values(values: &Tensor, y: &Tensor) -> ErmResult<()> {
    let mismatch = |reason| ShapeError::OutputTargetMismatch {
        output: values.shape().to_vec(),
        target: y.shape().to_vec(),
        reason,
    };
    if values.ndim() != 2 || y.ndim() != 2 {
        return Err(mismatch("loss values and targets must both be rank 2").into());
    }
    if values.shape()[0] != y.shape()[0] {
        return Err(mismatch("number of examples differs").into());
    }
    if values.shape()[1] != 1 {
        return Err(mismatch("loss values must have one column").into());
    }
    Ok(())
}

/// Model Jacobian rescaled by the per-output loss derivative `(n, k)`.
pub fn compose_with_model(
    model: &dyn Model, paras: &ParamSet, x: &Tensor, dloss: &Tensor,
) -> ErmResult<GradBundle> {
    let jacobian = model.gradient(paras, x)?;
    Ok(rescale_by_outputs(jacobian, dloss)?)
}

/// Base bundle rescaled by a wrapper's per-example coefficient `(n, 1)`.
pub fn rescale_base(bundle: GradBundle, coeffs: &Tensor) -> ErmResult<GradBundle> {
    Ok(rescale_bundle(bundle, coeffs)?)
}

/// Read an auxiliary scalar parameter.
///
/// # Errors
/// - `ConfigError::MissingParameter` if `name` is absent.
/// - `ShapeError::ParamShapeMismatch` if the tensor holds more than one value.
pub fn scalar_param(paras: &ParamSet, name: &str) -> ErmResult<f64> {
    let t = ParamStore::lookup(paras, name)?;
    match t.iter().next() {
        Some(&v) if t.len() == 1 => Ok(v),
        _ => Err(ShapeError::ParamShapeMismatch {
            name: name.to_string(),
            expected: vec![1, 1],
            found: t.shape().to_vec(),
        }
        .into()),
    }
}

/// Add a wrapper's auxiliary gradient `(n, 1)` to `bundle`, expanded to
/// `(n, ·shape(param))`.
///
/// # Errors
/// - `ConfigError::DuplicateParameter` if the base bundle already has `name`.
pub fn insert_auxiliary_gradient(
    bundle: &mut GradBundle, paras: &ParamSet, name: &str, coeffs: Tensor,
) -> ErmResult<()> {
    if bundle.contains_key(name) {
        return Err(ConfigError::DuplicateParameter { name: name.to_string() }.into());
    }
    let rank = ParamStore::lookup(paras, name)?.ndim();
    let entry = expand_trailing(&coeffs, rank + 1, name)?;
    bundle.insert(name.to_string(), entry);
    Ok(())
}

/// Refuse a wrapper whose auxiliary name is already used by the loss it wraps.
pub fn ensure_fresh_auxiliary(base: &dyn Loss, name: &str) -> ErmResult<()> {
    if base.auxiliary().iter().any(|(n, _)| n == name) {
        return Err(ConfigError::DuplicateParameter { name: name.to_string() }.into());
    }
    Ok(())
}

/// Mean of a gradient bundle over the batch axis, entry by entry.
pub fn mean_gradient(bundle: &GradBundle) -> ErmResult<GradBundle> {
    bundle
        .iter()
        .map(|(name, g)| Ok((name.clone(), batch_mean(g, "loss gradient")?)))
        .collect()
}
