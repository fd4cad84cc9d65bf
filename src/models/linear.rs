//! Linear regression model `X w (+ b)`.
//!
//! Shapes: inputs `(n, d)`, weights `w: (d, k)`, optional intercept
//! `b: (1, k)`, outputs `(n, k)`. The Jacobian of output `j` with respect to
//! `w[a, j]` is `x[a]`, so the `w` entry is `X` broadcast to `(n, d, k)`; the
//! `b` entry is all ones `(n, 1, k)`.
use ndarray::{ArrayView2, Axis, Ix2, IxDyn};
use rand::Rng;

use crate::{
    errors::ErmResult,
    models::traits::{Model, ParamStore},
    tensor::{
        errors::ShapeError,
        types::{GradBundle, ParamSet, ShapeSpec, Tensor},
    },
};

pub const WEIGHTS: &str = "w";
pub const INTERCEPT: &str = "b";

#[derive(Debug, Clone)]
pub struct LinearRegression {
    name: String,
    num_features: usize,
    num_outputs: usize,
    store: ParamStore,
}

impl LinearRegression {
    /// Construct with `num_features` inputs and `num_outputs` outputs.
    ///
    /// Values in `init` are validated against the declared shapes; missing
    /// ones are drawn uniformly from the default init range via `rng`.
    pub fn new<R: Rng + ?Sized>(
        num_features: usize, num_outputs: usize, intercept: bool, init: Option<ParamSet>,
        rng: &mut R,
    ) -> ErmResult<Self> {
        let mut shapes = ShapeSpec::new();
        shapes.insert(WEIGHTS.to_string(), vec![num_features, num_outputs]);
        if intercept {
            shapes.insert(INTERCEPT.to_string(), vec![1, num_outputs]);
        }
        let store = ParamStore::new(shapes, init, rng)?;
        Ok(Self { name: "Linear regression".to_string(), num_features, num_outputs, store })
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    fn has_intercept(&self) -> bool {
        self.store.shapes().contains_key(INTERCEPT)
    }

    fn inputs<'x>(&self, x: &'x Tensor) -> ErmResult<ArrayView2<'x, f64>> {
        let view = as_matrix(x, "linear model inputs")?;
        if view.ncols() != self.num_features {
            return Err(ShapeError::DimMismatch {
                what: "linear model features",
                expected: self.num_features,
                found: view.ncols(),
            }
            .into());
        }
        Ok(view)
    }
}

fn as_matrix<'t>(t: &'t Tensor, what: &'static str) -> ErmResult<ArrayView2<'t, f64>> {
    Ok(t.view()
        .into_dimensionality::<Ix2>()
        .map_err(|_| ShapeError::InvalidRank { what, expected: 2, found: t.ndim() })?)
}

impl Model for LinearRegression {
    fn name(&self) -> &str {
        &self.name
    }

    fn store(&self) -> &ParamStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut ParamStore {
        &mut self.store
    }

    fn evaluate(&self, paras: &ParamSet, x: &Tensor) -> ErmResult<Tensor> {
        self.store.validate(paras)?;
        let x = self.inputs(x)?;
        let w = as_matrix(ParamStore::lookup(paras, WEIGHTS)?, "linear model weights")?;
        let mut out = x.dot(&w);
        if self.has_intercept() {
            out += &as_matrix(ParamStore::lookup(paras, INTERCEPT)?, "linear model intercept")?;
        }
        Ok(out.into_dyn())
    }

    fn gradient(&self, paras: &ParamSet, x: &Tensor) -> ErmResult<GradBundle> {
        self.store.validate(paras)?;
        let x = self.inputs(x)?;
        let n = x.nrows();
        let k = self.num_outputs;

        let spread = x.insert_axis(Axis(2));
        let jac_w = spread
            .broadcast((n, self.num_features, k))
            .ok_or_else(|| ShapeError::NotBroadcastable {
                name: WEIGHTS.to_string(),
                coeffs: spread.shape().to_vec(),
                jacobian: vec![n, self.num_features, k],
            })?
            .to_owned();

        let mut bundle = GradBundle::new();
        bundle.insert(WEIGHTS.to_string(), jac_w.into_dyn());
        if self.has_intercept() {
            bundle.insert(INTERCEPT.to_string(), Tensor::ones(IxDyn(&[n, 1, k])));
        }
        Ok(bundle)
    }

    /// Outputs are affine in the parameters: every Hessian entry is zero, with
    /// shape `(n, ·shape(p), ·shape(p))`.
    fn hessian(&self, paras: &ParamSet, x: &Tensor) -> ErmResult<GradBundle> {
        self.store.validate(paras)?;
        let n = self.inputs(x)?.nrows();
        let mut bundle = GradBundle::new();
        for (name, shape) in self.store.shapes() {
            if name != WEIGHTS && name != INTERCEPT {
                continue;
            }
            let mut dims = vec![n];
            dims.extend_from_slice(shape);
            dims.extend_from_slice(shape);
            bundle.insert(name.clone(), Tensor::zeros(IxDyn(&dims)));
        }
        Ok(bundle)
    }
}
