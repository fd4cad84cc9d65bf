//! losses — per-example penalties composed with models.
//!
//! Purpose
//! -------
//! Turn model outputs and targets into per-example loss values and
//! per-example gradient bundles, and stack risk transforms (CVaR, Cressie–Read
//! DRO, exponential tilting) on top of any base loss.
//!
//! Key behaviors
//! -------------
//! - Base losses compute a per-output derivative `(n, k)` and rescale the
//!   model Jacobian with it ([`traits::compose_with_model`]).
//! - Wrappers rescale their base's bundle by a per-example coefficient
//!   `(n, 1)` padded with trailing axes, then add one entry for their own
//!   auxiliary scalar (`v` for CVaR, `theta` for DRO-CR).
//! - [`traits::Loss::objective`] gives the population objective (batch mean
//!   for most losses, closed forms for DRO-CR and tilting).
//!
//! Invariants & assumptions
//! ------------------------
//! - `value` always has shape `(n, 1)` with `n` equal to the number of
//!   targets; anything else is a `ShapeError` raised before arithmetic.
//! - A wrapper never overwrites an existing bundle entry: an auxiliary name
//!   already present is a `ConfigError::DuplicateParameter`.
//! - Auxiliary parameters must be attached to the model (see
//!   `models::attach_auxiliary`) before a wrapper is evaluated.
//!
//! Conventions
//! -----------
//! - Binary targets are `±1`; multiclass targets are one-hot.
//! - Wrappers own their base as `Box<dyn Loss>` and may be nested.

pub mod absolute;
pub mod classification;
pub mod cvar;
pub mod dro;
pub mod logistic;
pub mod margin;
pub mod quadratic;
pub mod tilted;
pub mod traits;

pub use self::absolute::Absolute;
pub use self::classification::ZeroOne;
pub use self::cvar::{CVAR_THRESHOLD, CVaR};
pub use self::dro::{DRO_SHIFT, DroCr};
pub use self::logistic::{Logistic, LogisticBinary};
pub use self::margin::MarginBinary;
pub use self::quadratic::Quadratic;
pub use self::tilted::Tilted;
pub use self::traits::Loss;

pub mod prelude {
    pub use super::traits::{Loss, mean_gradient};
    pub use super::{
        Absolute, CVaR, DroCr, Logistic, LogisticBinary, MarginBinary, Quadratic, Tilted, ZeroOne,
    };
}
