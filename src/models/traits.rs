//! models::traits — the `Model` contract and its parameter store.
//!
//! A model owns exactly one [`ParamStore`]: the declared shape of every
//! parameter plus its current value. Evaluation and differentiation take the
//! parameter set explicitly so that callers can probe candidate parameters
//! (e.g. inside a quasi-Newton line search) without touching model state.
use rand::Rng;

use crate::{
    config::errors::ConfigError,
    errors::{ErmError, ErmResult},
    tensor::{
        shapes::check_param_shape,
        types::{GradBundle, ParamSet, ShapeSpec, Tensor},
    },
};

/// Half-width of the symmetric range used for random parameter initialization.
pub const INIT_RANGE: f64 = 0.05;

/// Declared shapes and current values of a model's parameters.
///
/// The two maps always carry the same keys, and every value matches its
/// declared shape. Values can be modified in place through
/// [`ParamStore::values_mut`], but keys and shapes only change through
/// [`ParamStore::add`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParamStore {
    shapes: ShapeSpec,
    values: ParamSet,
}

impl ParamStore {
    /// Build a store from declared shapes and optional initial values.
    ///
    /// Supplied values are validated against `shapes`. Parameters without a
    /// supplied value are drawn uniformly from `[-INIT_RANGE, INIT_RANGE)`.
    ///
    /// # Errors
    /// - [`ErmError::Shape`] if a supplied value has the wrong shape or any
    ///   declared shape has rank < 2.
    /// - [`ConfigError::UnexpectedParameter`] if a supplied name is not
    ///   declared.
    pub fn new<R: Rng + ?Sized>(
        shapes: ShapeSpec, init: Option<ParamSet>, rng: &mut R,
    ) -> ErmResult<Self> {
        let mut supplied = init.unwrap_or_default();
        if let Some(name) = supplied.keys().find(|k| !shapes.contains_key(*k)) {
            return Err(ConfigError::UnexpectedParameter { name: name.clone() }.into());
        }
        let mut values = ParamSet::new();
        for (name, shape) in &shapes {
            let value = match supplied.remove(name) {
                Some(v) => v,
                None => random_uniform(shape, INIT_RANGE, rng),
            };
            check_param_shape(name, &value, shape)?;
            values.insert(name.clone(), value);
        }
        Ok(Self { shapes, values })
    }

    pub fn shapes(&self) -> &ShapeSpec {
        &self.shapes
    }

    pub fn values(&self) -> &ParamSet {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut ParamSet {
        &mut self.values
    }

    /// Look up one parameter in `paras`, reporting absence as a config error.
    pub fn lookup<'p>(paras: &'p ParamSet, name: &str) -> ErmResult<&'p Tensor> {
        paras.get(name).ok_or_else(|| ConfigError::missing_parameter(name).into())
    }

    /// Declare and insert a new parameter.
    ///
    /// # Errors
    /// - [`ConfigError::DuplicateParameter`] if `name` is already declared.
    /// - [`ErmError::Shape`] if `value` has rank < 2.
    pub fn add(&mut self, name: &str, value: Tensor) -> ErmResult<()> {
        if self.shapes.contains_key(name) {
            return Err(ConfigError::DuplicateParameter { name: name.to_string() }.into());
        }
        let shape = value.shape().to_vec();
        check_param_shape(name, &value, &shape)?;
        self.shapes.insert(name.to_string(), shape);
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Check that `paras` carries every declared parameter with its declared
    /// shape. Extra entries are allowed.
    pub fn validate(&self, paras: &ParamSet) -> ErmResult<()> {
        for (name, shape) in &self.shapes {
            check_param_shape(name, Self::lookup(paras, name)?, shape)?;
        }
        Ok(())
    }
}

fn random_uniform<R: Rng + ?Sized>(shape: &[usize], half_width: f64, rng: &mut R) -> Tensor {
    Tensor::from_shape_simple_fn(shape, || rng.gen_range(-half_width..half_width))
}

/// A parametrized function of an input batch.
///
/// Implementors provide the value and per-example Jacobian of their outputs;
/// parameter storage and validation come from the [`ParamStore`] they expose.
///
/// Jacobian convention: for a parameter of shape `(…, k)` feeding `k`
/// outputs, the entry for that parameter has shape `(n, …, k)` and holds
/// `∂out_j / ∂p[…, j]` for each example.
pub trait Model {
    fn name(&self) -> &str;

    fn store(&self) -> &ParamStore;

    fn store_mut(&mut self) -> &mut ParamStore;

    /// Outputs `(n, k)` for inputs `x` under parameters `paras`.
    fn evaluate(&self, paras: &ParamSet, x: &Tensor) -> ErmResult<Tensor>;

    /// Per-example Jacobian of the outputs, one entry per model parameter.
    fn gradient(&self, paras: &ParamSet, x: &Tensor) -> ErmResult<GradBundle>;

    /// Per-example Hessian, when the model provides one.
    fn hessian(&self, _paras: &ParamSet, _x: &Tensor) -> ErmResult<GradBundle> {
        Err(ErmError::not_implemented(format!("Hessian of model '{}'", self.name())))
    }

    fn shapes(&self) -> &ShapeSpec {
        self.store().shapes()
    }

    fn paras(&self) -> &ParamSet {
        self.store().values()
    }

    fn paras_mut(&mut self) -> &mut ParamSet {
        self.store_mut().values_mut()
    }

    /// Outputs under the model's current parameters.
    fn output(&self, x: &Tensor) -> ErmResult<Tensor> {
        self.evaluate(self.paras(), x)
    }
}
