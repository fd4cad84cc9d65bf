//! High-dimensional location estimators over a set of points.
//!
//! All routines take points as a tensor `(n, …)`, treat each slice along
//! axis 0 as one flattened vector, and return a tensor of shape `(…)`.
//!
//! - [`geometric_median`]: Weiszfeld iteration with the Vardi–Zhang
//!   correction for iterates that land on data points.
//! - [`small_ball`]: the data point whose median distance to the others is
//!   smallest (Hsu–Sabato style).
//! - [`geomed_set`]: the data point whose summed distance to the others is
//!   smallest.
//!
//! The last two never synthesize a point outside the data.
use ndarray::{Array1, Array2, Axis};
use std::{fmt, str::FromStr};
use tracing::{debug, trace};

use crate::{
    config::errors::ConfigError,
    errors::ErmResult,
    tensor::{
        errors::ShapeError,
        linalg::{flatten_rows, pairwise_distances, unflatten_row},
        types::Tensor,
    },
};

/// Distances below this are exact hits and get zero Weiszfeld weight.
pub const HIT_RADIUS: f64 = 1e-6;

/// Point sets whose spread is below this are treated as a single point.
pub const COINCIDENT_RADIUS: f64 = 1e-10;

pub const DEFAULT_MEDIAN_THRES: f64 = 1e-3;
pub const DEFAULT_MEDIAN_ITERS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MedianOptions {
    pub thres: f64,
    pub max_iter: usize,
}

impl MedianOptions {
    /// # Errors
    /// - `ConfigError::InvalidHyperparameter` if `thres` is negative or not
    ///   finite.
    pub fn new(thres: f64, max_iter: usize) -> Result<Self, ConfigError> {
        if !thres.is_finite() || thres < 0.0 {
            return Err(ConfigError::invalid("median_thres", thres, "must be finite and >= 0"));
        }
        Ok(Self { thres, max_iter })
    }
}

impl Default for MedianOptions {
    fn default() -> Self {
        Self { thres: DEFAULT_MEDIAN_THRES, max_iter: DEFAULT_MEDIAN_ITERS }
    }
}

fn rows_of(points: &Tensor, what: &'static str) -> ErmResult<(Array2<f64>, Vec<usize>)> {
    let flat = flatten_rows(points)?;
    if flat.nrows() == 0 {
        return Err(ShapeError::EmptyBatch { what }.into());
    }
    Ok((flat, points.shape()[1..].to_vec()))
}

fn norm(v: &Array1<f64>) -> f64 {
    v.dot(v).sqrt()
}

/// Geometric median of the rows of `points`.
///
/// One point is returned as is, two points give their midpoint, and a set of
/// coincident points returns the first. Otherwise the Weiszfeld update runs
/// from the mean until the iterate moves by at most `opts.thres` or
/// `opts.max_iter` updates have been made.
///
/// When `h` data points coincide with the iterate (within [`HIT_RADIUS`]),
/// they receive zero Weiszfeld weight and the update becomes
/// `max(0, 1 − h/r)·T(u) + min(1, h/r)·u`, with `r` the norm of the
/// unnormalized Weiszfeld step.
pub fn geometric_median(points: &Tensor, opts: &MedianOptions) -> ErmResult<Tensor> {
    let (a, row_shape) = rows_of(points, "geometric median")?;
    let n = a.nrows();

    if n == 1 {
        return Ok(unflatten_row(a.row(0).to_owned(), &row_shape)?);
    }
    if n == 2 {
        let mid = (&a.row(0) + &a.row(1)) * 0.5;
        return Ok(unflatten_row(mid, &row_shape)?);
    }
    let first = a.row(0);
    let spread = a.rows().into_iter().map(|r| norm(&(&r - &first))).fold(0.0_f64, f64::max);
    if spread < COINCIDENT_RADIUS {
        return Ok(unflatten_row(first.to_owned(), &row_shape)?);
    }

    let mut u = a.mean_axis(Axis(0)).ok_or(ShapeError::EmptyBatch { what: "geometric median" })?;
    let mut moved = opts.thres + 1.0;
    let mut t = 0;
    while moved > opts.thres && t < opts.max_iter {
        let recip: Array1<f64> = a
            .rows()
            .into_iter()
            .map(|r| {
                let d = norm(&(&r - &u));
                if d < HIT_RADIUS { 0.0 } else { 1.0 / d }
            })
            .collect();
        let recip_sum = recip.sum();
        if recip_sum == 0.0 {
            debug!("every point coincides with the iterate; stopping");
            break;
        }
        let weiszfeld = recip.dot(&a) / recip_sum;
        let r = norm(&((&weiszfeld - &u) * recip_sum));
        let hits = recip.iter().filter(|&&w| w == 0.0).count();
        let rinv = if hits > 0 { hits as f64 / r } else { 0.0 };

        let next = weiszfeld * (1.0 - rinv).max(0.0) + &u * rinv.min(1.0);
        moved = norm(&(&next - &u));
        u = next;
        t += 1;
    }
    trace!(iterations = t, "geometric median finished");
    Ok(unflatten_row(u, &row_shape)?)
}

fn argmin(values: impl Iterator<Item = f64>) -> usize {
    values
        .enumerate()
        .fold((0, f64::INFINITY), |(best, best_v), (i, v)| if v < best_v { (i, v) } else { (best, best_v) })
        .0
}

fn column_median(col: ndarray::ArrayView1<'_, f64>) -> f64 {
    let mut buf = col.to_vec();
    buf.sort_by(f64::total_cmp);
    let n = buf.len();
    if n % 2 == 1 { buf[n / 2] } else { 0.5 * (buf[n / 2 - 1] + buf[n / 2]) }
}

/// Data point with the smallest median distance to all points.
pub fn small_ball(points: &Tensor) -> ErmResult<Tensor> {
    let (a, row_shape) = rows_of(points, "small-ball median")?;
    let d = pairwise_distances(a.view(), a.view())?;
    let idx = argmin(d.columns().into_iter().map(column_median));
    Ok(unflatten_row(a.row(idx).to_owned(), &row_shape)?)
}

/// Data point with the smallest summed distance to all points.
pub fn geomed_set(points: &Tensor) -> ErmResult<Tensor> {
    let (a, row_shape) = rows_of(points, "set geometric median")?;
    let d = pairwise_distances(a.view(), a.view())?;
    let idx = argmin(d.sum_axis(Axis(0)).iter().copied());
    Ok(unflatten_row(a.row(idx).to_owned(), &row_shape)?)
}

/// Named choice of vector median.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VecMedian {
    Geometric,
    SmallBall,
    GeometricSet,
}

impl VecMedian {
    pub fn estimate(self, points: &Tensor, opts: &MedianOptions) -> ErmResult<Tensor> {
        match self {
            VecMedian::Geometric => geometric_median(points, opts),
            VecMedian::SmallBall => small_ball(points),
            VecMedian::GeometricSet => geomed_set(points),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            VecMedian::Geometric => "geomed",
            VecMedian::SmallBall => "smallball",
            VecMedian::GeometricSet => "geomed_set",
        }
    }
}

impl fmt::Display for VecMedian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VecMedian {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "geomed" => Ok(VecMedian::Geometric),
            "smallball" => Ok(VecMedian::SmallBall),
            "geomed_set" => Ok(VecMedian::GeometricSet),
            _ => Err(ConfigError::UnknownName {
                kind: "vector median",
                name: s.to_string(),
                expected: "'geomed', 'smallball', 'geomed_set'",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{IxDyn, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Degenerate inputs (one point, two points, coincident points).
    // - The exact-hit correction when the iterate lands on a data point.
    // - Robustness to an outlier, and the set-restricted medians.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that identical points are returned exactly for any set size.
    //
    // Given
    // -----
    // - k copies of the (2, 1) point [[1.5], [-2]] for k = 1..=5.
    //
    // Expect
    // ------
    // - The result has shape (2, 1) and equals the point exactly.
    fn coincident_points_are_idempotent() {
        let point = array![[1.5], [-2.0]].into_dyn();
        for k in 1..=5 {
            let mut values = Vec::new();
            for _ in 0..k {
                values.extend(point.iter().copied());
            }
            let points = Tensor::from_shape_vec(IxDyn(&[k, 2, 1]), values).unwrap();

            let med = geometric_median(&points, &MedianOptions::default()).unwrap();

            assert_eq!(med, point);
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify the two-point midpoint rule.
    //
    // Given
    // -----
    // - a = [0, 4], b = [2, −2].
    //
    // Expect
    // ------
    // - [1, 1] exactly.
    fn two_points_give_midpoint() {
        let points = array![[0.0, 4.0], [2.0, -2.0]].into_dyn();
        let med = geometric_median(&points, &MedianOptions::default()).unwrap();
        assert_eq!(med, array![1.0, 1.0].into_dyn());
    }

    #[test]
    // Purpose
    // -------
    // Verify the iteration handles an iterate that coincides with a data
    // point without producing NaN, and stays there when it is the median.
    //
    // Given
    // -----
    // - Points (0,0), (1,0), (−1,0), (0,1), (0,−1): the mean (0,0) is a data
    //   point and also the geometric median.
    //
    // Expect
    // ------
    // - A finite result equal to (0, 0).
    fn exact_hit_keeps_iterate_finite() {
        let points = array![[0.0, 0.0], [1.0, 0.0], [-1.0, 0.0], [0.0, 1.0], [0.0, -1.0]].into_dyn();

        let med = geometric_median(&points, &MedianOptions::new(1e-9, 100).unwrap()).unwrap();

        assert!(med.iter().all(|v| v.is_finite()));
        assert_abs_diff_eq!(med[[0]], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(med[[1]], 0.0, epsilon = 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Verify robustness to a gross outlier for all three estimators.
    //
    // Given
    // -----
    // - Four points near the origin and one at (1000, 1000).
    //
    // Expect
    // ------
    // - Each estimate lies within distance 1 of the origin.
    fn medians_resist_outlier() {
        let points = array![[0.1, 0.0], [-0.1, 0.0], [0.0, 0.1], [0.0, -0.1], [1000.0, 1000.0]].into_dyn();
        for m in [VecMedian::Geometric, VecMedian::SmallBall, VecMedian::GeometricSet] {
            let med = m.estimate(&points, &MedianOptions::new(1e-9, 1000).unwrap()).unwrap();
            let dist = med.iter().map(|v| v * v).sum::<f64>().sqrt();
            assert!(dist < 1.0, "{m} returned a point at distance {dist}");
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify the set-restricted medians return an actual data point.
    //
    // Given
    // -----
    // - Points 0, 1, 2, 10 on the line (shape (4, 1)).
    //
    // Expect
    // ------
    // - geomed_set picks 1 or 2 (both minimize the summed distance; the first
    //   is returned); small_ball picks a point in {1, 2}.
    fn set_medians_pick_data_points() {
        let points = array![[0.0], [1.0], [2.0], [10.0]].into_dyn();

        let g = geomed_set(&points).unwrap();
        let s = small_ball(&points).unwrap();

        assert_eq!(g, array![1.0].into_dyn());
        assert!(s[[0]] == 1.0 || s[[0]] == 2.0);
    }

    #[test]
    // Purpose
    // -------
    // Verify name parsing and the empty-batch error.
    //
    // Given
    // -----
    // - "SmallBall", "median"; a (0, 2) point set.
    //
    // Expect
    // ------
    // - SmallBall, UnknownName, and a shape error.
    fn parses_names_and_rejects_empty() {
        assert_eq!("SmallBall".parse::<VecMedian>().unwrap(), VecMedian::SmallBall);
        assert!(matches!("median".parse::<VecMedian>(), Err(ConfigError::UnknownName { .. })));
        let empty = Tensor::zeros(IxDyn(&[0, 2]));
        assert!(geometric_median(&empty, &MedianOptions::default()).is_err());
    }
}
