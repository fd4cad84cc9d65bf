//! tensor::shapes — broadcasting and shape-check helpers for gradient bundles.
//!
//! Purpose
//! -------
//! Implement the one composition rule every loss relies on: a gradient
//! bundle is rescaled, entry by entry, by a per-example coefficient tensor
//! that is padded with trailing singleton axes until it broadcasts against
//! each Jacobian. The same module hosts the parameter/direction checks used by
//! models and line-search updates.
//!
//! Invariants & assumptions
//! ------------------------
//! - A coefficient never has more axes than the Jacobian it rescales; the
//!   opposite is reported as [`ShapeError::RankInversion`], never repaired.
//! - After padding, each coefficient axis must equal the Jacobian axis or be 1.
//! - Rescaling works on owned bundle entries, so no caller can observe a
//!   shared Jacobian being modified in place.
//!
//! Conventions
//! -----------
//! - Per-output coefficients of shape `(n, k)` with `k > 1` are broadcast as
//!   `(n, 1, k)` against rank-3 Jacobians `(n, d, k)`; with `k = 1` plain
//!   trailing expansion applies.
//! - [`sign`] follows the three-valued convention (`sign(0) = 0`), unlike
//!   `f64::signum`.
use ndarray::Axis;

use crate::tensor::{
    errors::{ShapeError, ShapeResult},
    types::{GradBundle, Tensor},
};

/// Three-valued sign: `-1`, `0` or `+1` (NaN passes through).
#[inline]
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        x * 0.0
    }
}

/// Pad `coeffs` with trailing singleton axes up to rank `ndim`.
///
/// # Errors
/// - [`ShapeError::RankInversion`] if `coeffs` already has more than `ndim`
///   axes.
pub fn expand_trailing(coeffs: &Tensor, ndim: usize, name: &str) -> ShapeResult<Tensor> {
    if coeffs.ndim() > ndim {
        return Err(ShapeError::RankInversion {
            name: name.to_string(),
            coeff_rank: coeffs.ndim(),
            jacobian_rank: ndim,
        });
    }
    let mut out = coeffs.clone();
    while out.ndim() < ndim {
        let last = out.ndim();
        out = out.insert_axis(Axis(last));
    }
    Ok(out)
}

/// Rescale every entry of `bundle` by `coeffs`, padded per entry with trailing
/// singleton axes.
///
/// # Errors
/// - [`ShapeError::RankInversion`] if `coeffs` outranks any Jacobian.
/// - [`ShapeError::NotBroadcastable`] if an axis of the padded coefficients is
///   neither 1 nor equal to the Jacobian axis.
pub fn rescale_bundle(mut bundle: GradBundle, coeffs: &Tensor) -> ShapeResult<GradBundle> {
    for (name, jacobian) in bundle.iter_mut() {
        let padded = expand_trailing(coeffs, jacobian.ndim(), name)?;
        ensure_broadcastable(name, &padded, jacobian)?;
        *jacobian *= &padded;
    }
    Ok(bundle)
}

/// Rescale a model Jacobian bundle by per-output loss derivatives `(n, k)`.
///
/// With `k = 1` this is [`rescale_bundle`]. With `k > 1` the coefficients are
/// laid out as `(n, 1, k)`, which requires every Jacobian to be rank 3 with
/// its last axis indexing outputs.
///
/// # Errors
/// - [`ShapeError::InvalidRank`] if `coeffs` is not `(n, k)`, or if a
///   multi-output Jacobian is not rank 3.
/// - Any error from [`rescale_bundle`] / broadcasting checks.
pub fn rescale_by_outputs(mut bundle: GradBundle, coeffs: &Tensor) -> ShapeResult<GradBundle> {
    if coeffs.ndim() != 2 {
        return Err(ShapeError::InvalidRank {
            what: "per-output loss derivative",
            expected: 2,
            found: coeffs.ndim(),
        });
    }
    if coeffs.shape()[1] == 1 {
        return rescale_bundle(bundle, coeffs);
    }
    let spread = coeffs.clone().insert_axis(Axis(1));
    for (name, jacobian) in bundle.iter_mut() {
        if jacobian.ndim() < spread.ndim() {
            return Err(ShapeError::RankInversion {
                name: name.clone(),
                coeff_rank: spread.ndim(),
                jacobian_rank: jacobian.ndim(),
            });
        }
        if jacobian.ndim() != 3 {
            return Err(ShapeError::InvalidRank {
                what: "multi-output Jacobian",
                expected: 3,
                found: jacobian.ndim(),
            });
        }
        ensure_broadcastable(name, &spread, jacobian)?;
        *jacobian *= &spread;
    }
    Ok(bundle)
}

/// Check that `coeffs` (same rank as `jacobian`) broadcasts onto `jacobian`.
pub fn ensure_broadcastable(name: &str, coeffs: &Tensor, jacobian: &Tensor) -> ShapeResult<()> {
    let ok = coeffs.ndim() == jacobian.ndim()
        && coeffs.shape().iter().zip(jacobian.shape()).all(|(&c, &j)| c == j || c == 1);
    if !ok {
        return Err(ShapeError::NotBroadcastable {
            name: name.to_string(),
            coeffs: coeffs.shape().to_vec(),
            jacobian: jacobian.shape().to_vec(),
        });
    }
    Ok(())
}

/// Mean over the batch axis, dropping it.
///
/// # Errors
/// - [`ShapeError::InvalidRank`] for rank-0 input.
/// - [`ShapeError::EmptyBatch`] if the batch axis has length zero.
pub fn batch_mean(samples: &Tensor, what: &'static str) -> ShapeResult<Tensor> {
    if samples.ndim() == 0 {
        return Err(ShapeError::InvalidRank { what, expected: 1, found: 0 });
    }
    samples.mean_axis(Axis(0)).ok_or(ShapeError::EmptyBatch { what })
}

/// Mean over the batch axis, keeping it as a length-1 axis.
pub fn batch_mean_keepdims(samples: &Tensor, what: &'static str) -> ShapeResult<Tensor> {
    Ok(batch_mean(samples, what)?.insert_axis(Axis(0)))
}

/// Validate a tensor bound to `name` against its declared shape.
///
/// # Errors
/// - [`ShapeError::ParamRankTooSmall`] if the declared or actual rank is < 2.
/// - [`ShapeError::ParamShapeMismatch`] if the shapes differ.
pub fn check_param_shape(name: &str, tensor: &Tensor, expected: &[usize]) -> ShapeResult<()> {
    if expected.len() < 2 || tensor.ndim() < 2 {
        return Err(ShapeError::ParamRankTooSmall {
            name: name.to_string(),
            rank: expected.len().min(tensor.ndim()),
        });
    }
    if tensor.shape() != expected {
        return Err(ShapeError::ParamShapeMismatch {
            name: name.to_string(),
            expected: expected.to_vec(),
            found: tensor.shape().to_vec(),
        });
    }
    Ok(())
}

/// Reconcile a freshly aggregated direction with its parameter shape.
///
/// A direction with exactly one extra leading axis of length 1 is squeezed;
/// anything else that does not already share the parameter's rank is an
/// error. Shape equality itself is checked later by the line-search update.
///
/// # Errors
/// - [`ShapeError::DirectionMismatch`] for any other rank disagreement.
pub fn squeeze_leading(direction: Tensor, param_shape: &[usize], name: &str) -> ShapeResult<Tensor> {
    let mismatch = |direction: &Tensor| ShapeError::DirectionMismatch {
        name: name.to_string(),
        direction: direction.shape().to_vec(),
        param: param_shape.to_vec(),
    };
    let rank = direction.ndim();
    let target = param_shape.len();
    if rank == target {
        Ok(direction)
    } else if rank == target + 1 && direction.shape()[0] == 1 {
        Ok(direction.index_axis_move(Axis(0), 0))
    } else {
        Err(mismatch(&direction))
    }
}

/// `true` when every entry is finite.
pub fn all_finite(tensor: &Tensor) -> bool {
    tensor.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Trailing-axis expansion and the rank-inversion error.
    // - Bundle rescaling for single- and multi-output coefficients.
    // - The leading-singleton squeeze rule and its refusal cases.
    //
    // They intentionally DO NOT cover:
    // - Loss-specific derivative formulas (tested with each loss).
    // -------------------------------------------------------------------------

    fn tensor(shape: &[usize], values: Vec<f64>) -> Tensor {
        ArrayD::from_shape_vec(IxDyn(shape), values).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify `sign` is three-valued, unlike `f64::signum`.
    //
    // Given
    // -----
    // - Inputs -2, 0, +0.5 and -0.0.
    //
    // Expect
    // ------
    // - Outputs -1, 0, 1 and 0.
    fn sign_is_zero_at_zero() {
        assert_eq!(sign(-2.0), -1.0);
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(0.5), 1.0);
        assert_eq!(sign(-0.0), 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Verify that a coefficient with more axes than the Jacobian is rejected.
    //
    // Given
    // -----
    // - Coefficients of shape (2, 1, 1) and a target rank of 2.
    //
    // Expect
    // ------
    // - `expand_trailing` returns `ShapeError::RankInversion`.
    fn expand_trailing_rejects_rank_inversion() {
        // Arrange
        let coeffs = Tensor::zeros(IxDyn(&[2, 1, 1]));

        // Act
        let err = expand_trailing(&coeffs, 2, "w").unwrap_err();

        // Assert
        assert!(matches!(err, ShapeError::RankInversion { coeff_rank: 3, jacobian_rank: 2, .. }));
    }

    #[test]
    // Purpose
    // -------
    // Verify per-example rescaling of a rank-3 Jacobian by (n, 1) coefficients.
    //
    // Given
    // -----
    // - Jacobian of shape (2, 2, 1) filled with ones.
    // - Coefficients [[2], [3]].
    //
    // Expect
    // ------
    // - Example 0 slice equals 2, example 1 slice equals 3.
    fn rescale_bundle_broadcasts_trailing_axes() {
        // Arrange
        let mut bundle = GradBundle::new();
        bundle.insert("w".to_string(), Tensor::ones(IxDyn(&[2, 2, 1])));
        let coeffs = tensor(&[2, 1], vec![2.0, 3.0]);

        // Act
        let out = rescale_bundle(bundle, &coeffs).unwrap();

        // Assert
        let w = &out["w"];
        assert_eq!(w.shape(), &[2, 2, 1]);
        assert!(w.index_axis(Axis(0), 0).iter().all(|&v| v == 2.0));
        assert!(w.index_axis(Axis(0), 1).iter().all(|&v| v == 3.0));
    }

    #[test]
    // Purpose
    // -------
    // Verify that multi-output coefficients are spread along the output axis.
    //
    // Given
    // -----
    // - Jacobian (1, 2, 2) of ones and coefficients [[5, 7]].
    //
    // Expect
    // ------
    // - Column 0 of the Jacobian becomes 5 and column 1 becomes 7.
    fn rescale_by_outputs_spreads_over_output_axis() {
        // Arrange
        let mut bundle = GradBundle::new();
        bundle.insert("w".to_string(), Tensor::ones(IxDyn(&[1, 2, 2])));
        let coeffs = tensor(&[1, 2], vec![5.0, 7.0]);

        // Act
        let out = rescale_by_outputs(bundle, &coeffs).unwrap();

        // Assert
        let w = &out["w"];
        assert_eq!(w[[0, 0, 0]], 5.0);
        assert_eq!(w[[0, 1, 0]], 5.0);
        assert_eq!(w[[0, 0, 1]], 7.0);
        assert_eq!(w[[0, 1, 1]], 7.0);
    }

    #[test]
    // Purpose
    // -------
    // Verify the squeeze rule: one leading axis of length 1 is removed, a
    // leading axis of length k > 1 is an error.
    //
    // Given
    // -----
    // - Parameter shape (3, 1).
    // - Directions of shapes (1, 3, 1) and (2, 3, 1).
    //
    // Expect
    // ------
    // - The first squeezes to (3, 1); the second fails with DirectionMismatch.
    fn squeeze_leading_only_drops_singleton_axis() {
        // Arrange
        let ok = Tensor::zeros(IxDyn(&[1, 3, 1]));
        let bad = Tensor::zeros(IxDyn(&[2, 3, 1]));

        // Act
        let squeezed = squeeze_leading(ok, &[3, 1], "w").unwrap();
        let err = squeeze_leading(bad, &[3, 1], "w").unwrap_err();

        // Assert
        assert_eq!(squeezed.shape(), &[3, 1]);
        assert!(matches!(err, ShapeError::DirectionMismatch { .. }));
    }

    #[test]
    // Purpose
    // -------
    // Verify parameter shape validation catches both rank and extent problems.
    //
    // Given
    // -----
    // - A (3,) tensor and a (2, 1) tensor checked against declared (3, 1).
    //
    // Expect
    // ------
    // - ParamRankTooSmall and ParamShapeMismatch respectively.
    fn check_param_shape_reports_rank_and_extent() {
        let flat = Tensor::zeros(IxDyn(&[3]));
        let short = Tensor::zeros(IxDyn(&[2, 1]));

        assert!(matches!(
            check_param_shape("w", &flat, &[3, 1]),
            Err(ShapeError::ParamRankTooSmall { .. })
        ));
        assert!(matches!(
            check_param_shape("w", &short, &[3, 1]),
            Err(ShapeError::ParamShapeMismatch { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Ensure batch means fail loudly on an empty batch.
    //
    // Given
    // -----
    // - A tensor of shape (0, 2).
    //
    // Expect
    // ------
    // - `ShapeError::EmptyBatch`.
    fn batch_mean_rejects_empty_batch() {
        let empty = Tensor::zeros(IxDyn(&[0, 2]));
        assert!(matches!(batch_mean(&empty, "test"), Err(ShapeError::EmptyBatch { .. })));
    }
}
