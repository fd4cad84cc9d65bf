//! algos — learning algorithms that drive a model's parameters.
//!
//! Purpose
//! -------
//! Turn a model, a loss and batches of data into parameter updates. Iterative
//! algorithms share one contract ([`traits::Algorithm`]): advance, update,
//! check. A full-batch quasi-Newton fitter ([`quasi_newton::fit_lbfgs`]) sits
//! alongside them for problems small enough to solve in one call.
//!
//! Key behaviors
//! -------------
//! - [`linesearch::LineSearch`]: generic "direction, then step" driver with a
//!   pluggable [`linesearch::DirectionRule`].
//! - Direction rules:
//!   - [`gd::GdErm`]: negative batch-mean gradient (plain ERM by gradient
//!     descent).
//!   - [`rgd::RgdMest`]: negative coordinate-wise M-estimate of the
//!     per-example gradients.
//!   - [`rgd::RgdVecMedian`]: negative vector median of the per-example
//!     gradients.
//! - [`quasi_newton`]: L-BFGS over the flattened parameter set via `argmin`.
//!
//! Invariants & assumptions
//! ------------------------
//! - The algorithm is the only component that mutates parameters; models and
//!   losses evaluate at explicit parameter sets.
//! - An update is all-or-nothing: validation happens before any parameter is
//!   written.
//! - Single-threaded: a fit owns its model for its whole duration.
//!
//! Conventions
//! -----------
//! - Stopping is driven by the caller through `check(cond)`; the algorithms
//!   keep no iteration cap of their own.
//! - Per-step progress is emitted as `tracing` events at `debug` level.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the stop-flag cycle, update validation, single hand-
//!   checked steps, and robust aggregation.
//! - Integration tests under `tests/` fit noiseless and heavy-tailed linear
//!   data end to end.

pub mod gd;
pub mod linesearch;
pub mod quasi_newton;
pub mod rgd;
pub mod traits;

pub use self::gd::GdErm;
pub use self::linesearch::{DirectionRule, LineSearch, StepCoefs, apply_direction};
pub use self::quasi_newton::{FitOutcome, LbfgsOptions, LineSearcher, Tolerances, fit_lbfgs};
pub use self::rgd::{RgdMest, RgdVecMedian};
pub use self::traits::{Algorithm, RunState, StopFlag};

pub mod prelude {
    pub use super::gd::GdErm;
    pub use super::linesearch::{DirectionRule, LineSearch, StepCoefs};
    pub use super::quasi_newton::prelude::*;
    pub use super::rgd::{RgdMest, RgdVecMedian};
    pub use super::traits::{Algorithm, RunState};
}
