//! quasi_newton::types — flat numeric aliases, solver wiring, and the layout
//! that maps a named parameter set onto one flat vector.
//!
//! Purpose
//! -------
//! L-BFGS works on a single `Array1<f64>`. A model's parameters are a
//! `BTreeMap` of tensors of different shapes. [`ParamLayout`] records the
//! names and shapes once and converts in both directions.
//!
//! Conventions
//! -----------
//! - Entries are laid out in the map's key order, each tensor in logical
//!   (row-major) order.
//! - Gradient bundles are flattened with the same layout, so the flat
//!   gradient lines up with the flat parameter vector.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::{Array1, IxDyn, s};
use std::collections::{BTreeMap, HashMap};

use crate::{
    config::errors::ConfigError,
    errors::ErmResult,
    tensor::{
        errors::ShapeError,
        types::{ParamSet, Tensor},
    },
};

/// Flattened parameter vector.
pub type Theta = Array1<f64>;

/// Flattened objective gradient, aligned with [`Theta`].
pub type Grad = Array1<f64>;

/// Scalar objective value.
pub type Cost = f64;

/// Function-evaluation counters reported by the solver.
pub type FnEvalMap = HashMap<String, u64>;

/// Default L-BFGS history size.
pub const DEFAULT_LBFGS_MEM: usize = 7;

pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;

/// Names and shapes of a parameter set, in key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamLayout {
    entries: Vec<(String, Vec<usize>)>,
    len: usize,
}

impl ParamLayout {
    pub fn of(paras: &ParamSet) -> Self {
        let entries: Vec<(String, Vec<usize>)> =
            paras.iter().map(|(name, t)| (name.clone(), t.shape().to_vec())).collect();
        let len = entries.iter().map(|(_, shape)| shape.iter().product::<usize>()).sum();
        Self { entries, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Concatenate the tensors of `bundle` in layout order.
    ///
    /// # Errors
    /// - `ConfigError::MissingParameter` if an entry is absent.
    /// - `ShapeError::ParamShapeMismatch` if an entry has another shape.
    pub fn flatten(&self, bundle: &BTreeMap<String, Tensor>) -> ErmResult<Theta> {
        let mut flat = Vec::with_capacity(self.len);
        for (name, shape) in &self.entries {
            let t = bundle.get(name).ok_or_else(|| ConfigError::missing_parameter(name))?;
            if t.shape() != shape.as_slice() {
                return Err(ShapeError::ParamShapeMismatch {
                    name: name.clone(),
                    expected: shape.clone(),
                    found: t.shape().to_vec(),
                }
                .into());
            }
            flat.extend(t.iter().copied());
        }
        Ok(Theta::from(flat))
    }

    /// Split a flat vector back into named tensors.
    ///
    /// # Errors
    /// - `ShapeError::DimMismatch` if `theta` has the wrong length.
    pub fn unflatten(&self, theta: &Theta) -> ErmResult<ParamSet> {
        if theta.len() != self.len {
            return Err(ShapeError::DimMismatch {
                what: "flattened parameters",
                expected: self.len,
                found: theta.len(),
            }
            .into());
        }
        let mut paras = ParamSet::new();
        let mut start = 0;
        for (name, shape) in &self.entries {
            let size: usize = shape.iter().product();
            let chunk = theta.slice(s![start..start + size]).to_vec();
            let t = Tensor::from_shape_vec(IxDyn(shape), chunk).map_err(|_| ShapeError::DimMismatch {
                what: "flattened parameter entry",
                expected: size,
                found: theta.len() - start,
            })?;
            paras.insert(name.clone(), t);
            start += size;
        }
        Ok(paras)
    }
}
