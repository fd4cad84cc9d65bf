//! robust_erm — empirical risk minimization with composable risk transforms
//! and robust gradient descent.
//!
//! Purpose
//! -------
//! Provide the building blocks for learning a parametrized model by
//! minimizing a (possibly transformed) empirical risk: a model contract with
//! per-example Jacobians, base losses that compose with it, risk wrappers
//! (CVaR, Cressie–Read DRO, tilting) that add their own auxiliary
//! parameters, and line-search algorithms whose update direction is either
//! the mean gradient or a robust aggregate of per-example gradients.
//!
//! Key behaviors
//! -------------
//! - [`models`]: `Model` trait, `ParamStore`, `LinearRegression`.
//! - [`losses`]: `Loss` trait, base losses and risk transforms.
//! - [`robust`]: M-estimators of location and scale, vector medians.
//! - [`algos`]: `LineSearch` with GD / robust-GD direction rules, and an
//!   L-BFGS batch fitter.
//! - [`config`]: hyperparameter mappings and builders.
//! - [`noise`]: named noise distributions for synthetic data.
//!
//! Invariants & assumptions
//! ------------------------
//! - Data are `ndarray` tensors with the example index on axis 0.
//! - Parameter sets are ordered by name; every iteration over parameters is
//!   deterministic.
//! - Randomness is always supplied by the caller.
//!
//! Conventions
//! -----------
//! - Every fallible call returns [`errors::ErmResult`].
//! - Diagnostics go through `tracing`; the crate installs no subscriber.

pub mod algos;
pub mod config;
pub mod errors;
pub mod losses;
pub mod models;
pub mod noise;
pub mod robust;
pub mod tensor;

pub mod prelude {
    pub use crate::algos::prelude::*;
    pub use crate::config::prelude::*;
    pub use crate::errors::{ErmError, ErmResult};
    pub use crate::losses::prelude::*;
    pub use crate::models::prelude::*;
    pub use crate::noise::prelude::*;
    pub use crate::robust::prelude::*;
    pub use crate::tensor::prelude::*;
}
