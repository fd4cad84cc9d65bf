//! robust — statistics that tolerate heavy tails and outliers.
//!
//! Purpose
//! -------
//! Provide the robust aggregation primitives used by robust gradient descent:
//! coordinate-wise M-estimators of location and scale, and vector medians.
//!
//! Key behaviors
//! -------------
//! - [`influence::Influence`] and [`chi::Chi`]: named elementwise transforms
//!   with their classical constants, parsed from names at construction time.
//! - [`mest`]: fixed-point solvers `est_loc_fixedpt` / `est_scale_chi_fixedpt`
//!   plus MAD alternatives, all reducing along axis 0 and keeping it as a
//!   leading singleton.
//! - [`vecmean`]: geometric median (Vardi–Zhang), small-ball median and set
//!   geometric median, reducing `(n, …)` to `(…)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Numeric degeneracies are absorbed locally and never raised: zero scales
//!   are floored at `mest::CHI_MIN`, near-zero distances get zero weight.
//! - Iteration caps bound every solver; hitting a cap returns the last
//!   iterate.
//!
//! Testing notes
//! -------------
//! - Unit tests check closed-form constants, degenerate inputs, and
//!   robustness against single gross outliers.

pub mod chi;
pub mod influence;
pub mod mest;
pub mod vecmean;

pub use self::chi::Chi;
pub use self::influence::Influence;
pub use self::mest::{MestOptions, ScaleEstimator, est_loc_fixedpt, est_scale_chi_fixedpt};
pub use self::vecmean::{MedianOptions, VecMedian, geomed_set, geometric_median, small_ball};

pub mod prelude {
    pub use super::chi::Chi;
    pub use super::influence::Influence;
    pub use super::mest::{MestOptions, ScaleEstimator, est_loc_fixedpt, est_scale_chi_fixedpt};
    pub use super::vecmean::{MedianOptions, VecMedian};
}
