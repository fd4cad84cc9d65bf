//! robust::mest — fixed-point M-estimators of location and scale.
//!
//! Purpose
//! -------
//! Estimate, coordinate by coordinate, a robust location and scale of a batch
//! of samples `(n, …)` along axis 0. Results keep the batch axis as a leading
//! singleton, i.e. they have shape `(1, …)`.
//!
//! Key behaviors
//! -------------
//! - Location: `θ ← θ + s · mean(ψ((X − θ) / s))`, started at the sample mean.
//! - Scale: `s ← s · sqrt(1 + max(mean(χ(X / s)) / β, −1))`, started at the
//!   sample standard deviation, with `β = −χ(0)`.
//! - Both stop once every coordinate moves by at most `thres`, or after
//!   `iters` updates, and return the last iterate either way.
//! - MAD alternatives about the mean, zero and the median.
//!
//! Invariants & assumptions
//! ------------------------
//! - Degenerate scale estimates never propagate: a coordinate whose sample
//!   standard deviation is zero, or whose iterate falls to `1e-12` or below,
//!   is clamped to [`CHI_MIN`]. MAD estimates obey the same floor.
//! - Non-convergence within `iters` is not an error.
//!
//! Conventions
//! -----------
//! - Influence and chi functions are passed as plain `Fn(f64) -> f64`, so the
//!   named families in `robust::influence` / `robust::chi` and ad-hoc closures
//!   (e.g. the identity) share one solver.
use ndarray::{Axis, Zip};
use std::{fmt, str::FromStr};
use tracing::trace;

use crate::{
    config::errors::ConfigError,
    errors::ErmResult,
    robust::chi::Chi,
    tensor::{
        errors::ShapeError,
        shapes::batch_mean_keepdims,
        types::Tensor,
    },
};

/// Floor for degenerate scale estimates.
pub const CHI_MIN: f64 = 0.001;

/// Iterates at or below this value are treated as degenerate.
const SCALE_DEGENERATE: f64 = 1e-12;

pub const DEFAULT_MEST_THRES: f64 = 1e-3;
pub const DEFAULT_MEST_ITERS: usize = 50;

/// Stopping rule shared by the fixed-point solvers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MestOptions {
    pub thres: f64,
    pub iters: usize,
}

impl MestOptions {
    /// # Errors
    /// - `ConfigError::InvalidHyperparameter` if `thres` is negative or not
    ///   finite.
    /// - `ConfigError::InvalidIterations` if `iters == 0`.
    pub fn new(thres: f64, iters: usize) -> Result<Self, ConfigError> {
        if !thres.is_finite() || thres < 0.0 {
            return Err(ConfigError::invalid("mest_thres", thres, "must be finite and >= 0"));
        }
        if iters == 0 {
            return Err(ConfigError::InvalidIterations {
                name: "mest_iters".to_string(),
                value: iters,
                reason: "must be at least 1",
            });
        }
        Ok(Self { thres, iters })
    }
}

impl Default for MestOptions {
    fn default() -> Self {
        Self { thres: DEFAULT_MEST_THRES, iters: DEFAULT_MEST_ITERS }
    }
}

fn max_abs_diff(a: &Tensor, b: &Tensor) -> f64 {
    Zip::from(a).and(b).fold(0.0_f64, |acc, &x, &y| acc.max((x - y).abs()))
}

/// Broadcast `scale` to the `(1, …)` shape of a location estimate, raising
/// degenerate entries (at or below `SCALE_DEGENERATE`) to [`CHI_MIN`].
fn spread_scale(scale: &Tensor, target: &Tensor) -> ErmResult<Tensor> {
    if let Some(&bad) = scale.iter().find(|v| !v.is_finite()) {
        return Err(ConfigError::invalid("scale", bad, "must be finite").into());
    }
    let view = scale.broadcast(target.raw_dim()).ok_or_else(|| ShapeError::NotBroadcastable {
        name: "scale".to_string(),
        coeffs: scale.shape().to_vec(),
        jacobian: target.shape().to_vec(),
    })?;
    Ok(view.mapv(|v| if v <= SCALE_DEGENERATE { CHI_MIN } else { v }))
}

/// Fixed-point M-estimate of location along axis 0.
///
/// `scale` is either a single value or a tensor broadcastable to `(1, …)`.
/// Zero or negative scale entries are floored at [`CHI_MIN`].
///
/// # Errors
/// - `ShapeError::EmptyBatch` / `InvalidRank` for empty or rank-0 samples.
/// - `ShapeError::NotBroadcastable` if `scale` does not fit `(1, …)`.
/// - `ConfigError::InvalidHyperparameter` if `scale` holds NaN or ±∞.
pub fn est_loc_fixedpt<F>(samples: &Tensor, scale: &Tensor, influence: F, opts: &MestOptions) -> ErmResult<Tensor>
where
    F: Fn(f64) -> f64,
{
    let mut theta = batch_mean_keepdims(samples, "location estimate")?;
    let s = spread_scale(scale, &theta)?;

    for t in 0..opts.iters {
        let standardized = (samples - &theta) / &s;
        let correction = batch_mean_keepdims(&standardized.mapv(&influence), "location estimate")? * &s;
        let next = &theta + &correction;
        let moved = max_abs_diff(&next, &theta);
        theta = next;
        if moved <= opts.thres {
            trace!(iterations = t + 1, "location fixed point converged");
            break;
        }
    }
    Ok(theta)
}

/// Fixed-point M-estimate of scale along axis 0 using chi function `chi`.
///
/// # Errors
/// - `ShapeError::EmptyBatch` / `InvalidRank` for empty or rank-0 samples.
/// - `ConfigError::InvalidHyperparameter` if `−chi(0)` is not a positive
///   finite number.
pub fn est_scale_chi_fixedpt<F>(samples: &Tensor, chi: F, opts: &MestOptions) -> ErmResult<Tensor>
where
    F: Fn(f64) -> f64,
{
    let beta = -chi(0.0);
    if !(beta.is_finite() && beta > 0.0) {
        return Err(ConfigError::invalid("beta", beta, "-chi(0) must be positive and finite").into());
    }
    batch_mean_keepdims(samples, "scale estimate")?;

    let mut s = samples.std_axis(Axis(0), 0.0).insert_axis(Axis(0));
    let degenerate = s.mapv(|v| v <= 0.0);
    Zip::from(&mut s).and(&degenerate).for_each(|v, &bad| {
        if bad {
            *v = 1.0;
        }
    });

    for t in 0..opts.iters {
        let ratio = batch_mean_keepdims(&(samples / &s).mapv(&chi), "scale estimate")?;
        let mut next = ratio.mapv(|m| (1.0 + (m / beta).max(-1.0)).sqrt()) * &s;
        next.mapv_inplace(|v| if v <= SCALE_DEGENERATE { CHI_MIN } else { v });
        let moved = max_abs_diff(&next, &s);
        s = next;
        if moved <= opts.thres {
            trace!(iterations = t + 1, "scale fixed point converged");
            break;
        }
    }

    Zip::from(&mut s).and(&degenerate).for_each(|v, &bad| {
        if bad {
            *v = CHI_MIN;
        }
    });
    Ok(s)
}

/// Median of a slice (average of the two middle values for even length).
fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let n = values.len();
    if n % 2 == 1 { values[n / 2] } else { 0.5 * (values[n / 2 - 1] + values[n / 2]) }
}

/// Coordinate-wise median along axis 0, shape `(1, …)`.
pub fn median_axis0(samples: &Tensor) -> ErmResult<Tensor> {
    batch_mean_keepdims(samples, "median")?;
    Ok(samples
        .map_axis(Axis(0), |lane| {
            let mut buf = lane.to_vec();
            median(&mut buf)
        })
        .insert_axis(Axis(0)))
}

fn floor_scale(mut s: Tensor) -> Tensor {
    s.mapv_inplace(|v| if v <= SCALE_DEGENERATE { CHI_MIN } else { v });
    s
}

/// Median absolute deviation about the mean.
pub fn scale_madmean(samples: &Tensor) -> ErmResult<Tensor> {
    let center = batch_mean_keepdims(samples, "MAD about the mean")?;
    Ok(floor_scale(median_axis0(&(samples - &center).mapv(f64::abs))?))
}

/// Median absolute deviation about zero.
pub fn scale_madzero(samples: &Tensor) -> ErmResult<Tensor> {
    Ok(floor_scale(median_axis0(&samples.mapv(f64::abs))?))
}

/// Median absolute deviation about the median.
pub fn scale_madmed(samples: &Tensor) -> ErmResult<Tensor> {
    let center = median_axis0(samples)?;
    Ok(floor_scale(median_axis0(&(samples - &center).mapv(f64::abs))?))
}

/// Named choice of scale estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleEstimator {
    Chi(Chi),
    MadMean,
    MadZero,
    MadMed,
}

impl ScaleEstimator {
    pub fn estimate(self, samples: &Tensor, opts: &MestOptions) -> ErmResult<Tensor> {
        match self {
            ScaleEstimator::Chi(chi) => est_scale_chi_fixedpt(samples, |u| chi.apply(u), opts),
            ScaleEstimator::MadMean => scale_madmean(samples),
            ScaleEstimator::MadZero => scale_madzero(samples),
            ScaleEstimator::MadMed => scale_madmed(samples),
        }
    }
}

impl fmt::Display for ScaleEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleEstimator::Chi(chi) => write!(f, "chi_{chi}"),
            ScaleEstimator::MadMean => f.write_str("madmean"),
            ScaleEstimator::MadZero => f.write_str("madzero"),
            ScaleEstimator::MadMed => f.write_str("madmed"),
        }
    }
}

impl FromStr for ScaleEstimator {
    type Err = ConfigError;

    /// Accepts `madmean`, `madzero`, `madmed` (optionally `scale_`-prefixed)
    /// or any chi function name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        match lowered.strip_prefix("scale_").unwrap_or(&lowered) {
            "madmean" => Ok(ScaleEstimator::MadMean),
            "madzero" => Ok(ScaleEstimator::MadZero),
            "madmed" => Ok(ScaleEstimator::MadMed),
            _ => s.parse::<Chi>().map(ScaleEstimator::Chi).map_err(|_| ConfigError::UnknownName {
                kind: "scale estimator",
                name: s.to_string(),
                expected: "'madmean', 'madzero', 'madmed', or a chi function name",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{errors::ErmError, robust::influence::Influence};
    use approx::assert_abs_diff_eq;
    use ndarray::{IxDyn, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The identity-influence reduction to the sample mean.
    // - Robustness of bounded influence to a gross outlier.
    // - Degenerate (constant) columns in scale estimation, and zero or
    //   non-finite scales handed to the location solver.
    // - MAD variants and the estimator name parser.
    //
    // They intentionally DO NOT cover:
    // - Convergence rates of the fixed-point iterations.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that with ψ(u) = u the location solver returns the sample mean
    // after one iteration.
    //
    // Given
    // -----
    // - A (4, 2) sample, arbitrary scale 3.7, one allowed iteration.
    //
    // Expect
    // ------
    // - Output (1, 2) equal to the column means.
    fn identity_influence_returns_mean() {
        // Arrange
        let x = array![[1.0, -2.0], [3.0, 0.0], [5.0, 4.0], [7.0, 10.0]].into_dyn();
        let scale = Tensor::from_elem(IxDyn(&[1, 1]), 3.7);
        let opts = MestOptions::new(1e-3, 1).unwrap();

        // Act
        let theta = est_loc_fixedpt(&x, &scale, |u| u, &opts).unwrap();

        // Assert
        assert_eq!(theta.shape(), &[1, 2]);
        assert_abs_diff_eq!(theta[[0, 0]], 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(theta[[0, 1]], 3.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Verify that a bounded influence function resists a gross outlier.
    //
    // Given
    // -----
    // - Nine values near 0 and one value at 1000, scale 1, Huber influence.
    //
    // Expect
    // ------
    // - The estimate is far closer to 0 than the sample mean (≈ 100).
    fn huber_location_resists_outlier() {
        let mut values = vec![-0.2, -0.1, 0.0, 0.1, 0.2, -0.15, 0.15, 0.05, -0.05];
        values.push(1000.0);
        let x = Tensor::from_shape_vec(IxDyn(&[10, 1]), values).unwrap();
        let scale = Tensor::from_elem(IxDyn(&[1, 1]), 1.0);

        let theta = est_loc_fixedpt(&x, &scale, |u| Influence::Huber.apply(u), &MestOptions::new(1e-9, 500).unwrap())
            .unwrap();

        assert!(theta[[0, 0]].abs() < 0.5, "estimate {} should ignore the outlier", theta[[0, 0]]);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a zero scale is floored instead of producing NaN, and a
    // non-finite scale is refused.
    //
    // Given
    // -----
    // - Three zeros with scale [[0]]; the column [1, 2, 3] with scale [[0]];
    //   the same column with scale [[NaN]]. Identity influence, defaults.
    //
    // Expect
    // ------
    // - Finite estimates equal to the sample means (0 and 2).
    // - InvalidHyperparameter for the NaN scale.
    fn zero_scale_is_floored() {
        // Arrange
        let zeros = Tensor::zeros(IxDyn(&[3, 1]));
        let column = array![[1.0], [2.0], [3.0]].into_dyn();
        let zero_scale = Tensor::zeros(IxDyn(&[1, 1]));
        let nan_scale = Tensor::from_elem(IxDyn(&[1, 1]), f64::NAN);
        let opts = MestOptions::default();

        // Act
        let flat = est_loc_fixedpt(&zeros, &zero_scale, |u| u, &opts).unwrap();
        let spread = est_loc_fixedpt(&column, &zero_scale, |u| u, &opts).unwrap();
        let refused = est_loc_fixedpt(&column, &nan_scale, |u| u, &opts);

        // Assert
        assert!(flat[[0, 0]].is_finite());
        assert_abs_diff_eq!(flat[[0, 0]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(spread[[0, 0]], 2.0, epsilon = 1e-9);
        assert!(matches!(
            refused,
            Err(ErmError::Config(ConfigError::InvalidHyperparameter { .. }))
        ));
    }

    #[test]
    // Purpose
    // -------
    // Ensure constant columns are clamped to the floor instead of yielding
    // zero or NaN, while informative columns get a positive finite scale.
    //
    // Given
    // -----
    // - Column 0 constant, column 1 spread; Geman-quadratic chi.
    //
    // Expect
    // ------
    // - Scale (1, 2) with column 0 = CHI_MIN and column 1 finite, > CHI_MIN.
    fn scale_clamps_degenerate_columns() {
        // Arrange
        let x = array![[2.0, -1.0], [2.0, 0.5], [2.0, 1.5], [2.0, -2.0]].into_dyn();

        // Act
        let s = est_scale_chi_fixedpt(&x, |u| Chi::GemanQuad.apply(u), &MestOptions::default()).unwrap();

        // Assert
        assert_eq!(s.shape(), &[1, 2]);
        assert_eq!(s[[0, 0]], CHI_MIN);
        assert!(s[[0, 1]].is_finite() && s[[0, 1]] > CHI_MIN);
    }

    #[test]
    // Purpose
    // -------
    // Verify the three MAD variants on a small column.
    //
    // Given
    // -----
    // - Column [1, 2, 3, 4, 100]: mean 22, median 3.
    //
    // Expect
    // ------
    // - madzero = 3, madmed = 1, madmean = median(|x − 22|) = 20.
    fn mad_variants() {
        let x = Tensor::from_shape_vec(IxDyn(&[5, 1]), vec![1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();

        assert_abs_diff_eq!(scale_madzero(&x).unwrap()[[0, 0]], 3.0);
        assert_abs_diff_eq!(scale_madmed(&x).unwrap()[[0, 0]], 1.0);
        assert_abs_diff_eq!(scale_madmean(&x).unwrap()[[0, 0]], 20.0);
    }

    #[test]
    // Purpose
    // -------
    // Verify estimator names and option validation.
    //
    // Given
    // -----
    // - Names "madmed", "scale_madzero", "tukey", "mystery"; options with
    //   zero iterations.
    //
    // Expect
    // ------
    // - MadMed, MadZero, Chi(Tukey), UnknownName, InvalidIterations.
    fn parses_names_and_validates_options() {
        assert_eq!("madmed".parse::<ScaleEstimator>().unwrap(), ScaleEstimator::MadMed);
        assert_eq!("scale_madzero".parse::<ScaleEstimator>().unwrap(), ScaleEstimator::MadZero);
        assert_eq!("tukey".parse::<ScaleEstimator>().unwrap(), ScaleEstimator::Chi(Chi::Tukey));
        assert!(matches!("mystery".parse::<ScaleEstimator>(), Err(ConfigError::UnknownName { .. })));
        assert!(matches!(MestOptions::new(1e-3, 0), Err(ConfigError::InvalidIterations { .. })));
    }
}
