//! Vector/array helpers: row flattening, pairwise distances, label encodings.
//!
//! Conventions:
//! - "Rows" are the slices along axis 0; a tensor of shape `(n, a, b)` is
//!   viewed as `n` vectors of length `a·b`.
//! - Labels handed to [`onehot`] are class indices `0..num_classes`; labels
//!   handed to [`pmone`] / [`flip_pmone`] are arbitrary reals mapped to ±1.
use ndarray::{Array1, Array2, ArrayView2, Axis, IxDyn};
use rand::Rng;

use crate::tensor::{
    errors::{ShapeError, ShapeResult},
    types::Tensor,
};

/// View `samples` (shape `(n, …)`) as an `(n, p)` matrix, `p = ∏ …`.
///
/// # Errors
/// - [`ShapeError::InvalidRank`] for rank-0 input.
pub fn flatten_rows(samples: &Tensor) -> ShapeResult<Array2<f64>> {
    if samples.ndim() == 0 {
        return Err(ShapeError::InvalidRank { what: "row flattening", expected: 1, found: 0 });
    }
    let n = samples.shape()[0];
    let p: usize = samples.shape()[1..].iter().product();
    let flat: Vec<f64> = samples.iter().copied().collect();
    Array2::from_shape_vec((n, p), flat)
        .map_err(|_| ShapeError::DimMismatch { what: "row flattening", expected: n * p, found: samples.len() })
}

/// Inverse of [`flatten_rows`] for a single row: reshape a length-`p` vector
/// into `row_shape`.
pub fn unflatten_row(row: Array1<f64>, row_shape: &[usize]) -> ShapeResult<Tensor> {
    let found = row.len();
    let expected: usize = row_shape.iter().product();
    Tensor::from_shape_vec(IxDyn(row_shape), row.to_vec())
        .map_err(|_| ShapeError::DimMismatch { what: "row reshape", expected, found })
}

/// Euclidean norm of every row.
pub fn row_norms(a: ArrayView2<'_, f64>) -> Array1<f64> {
    a.map_axis(Axis(1), |row| row.dot(&row).sqrt())
}

/// Pairwise Euclidean distances between the rows of `a` `(n, d)` and `b`
/// `(m, d)`, returned as `(n, m)`.
///
/// Uses `‖a‖² + ‖b‖² − 2 a·b`; the tiny negative residuals that cancellation
/// can leave are clipped to zero before the square root.
///
/// # Errors
/// - [`ShapeError::DimMismatch`] if the row lengths differ.
pub fn pairwise_distances(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> ShapeResult<Array2<f64>> {
    if a.ncols() != b.ncols() {
        return Err(ShapeError::DimMismatch {
            what: "pairwise distances",
            expected: a.ncols(),
            found: b.ncols(),
        });
    }
    let a_sq = a.map_axis(Axis(1), |row| row.dot(&row));
    let b_sq = b.map_axis(Axis(1), |row| row.dot(&row));
    let mut out = a.dot(&b.t()) * -2.0;
    out += &a_sq.insert_axis(Axis(1));
    out += &b_sq.insert_axis(Axis(0));
    out.mapv_inplace(|v| if v < 0.0 { 0.0 } else { v.sqrt() });
    Ok(out)
}

/// One-hot encode class indices into an `(n, num_classes)` tensor.
///
/// When `num_classes` is `None`, it is taken as `max(labels) + 1`.
///
/// # Errors
/// - [`ShapeError::DimMismatch`] if a label is `>= num_classes`.
pub fn onehot(labels: &[usize], num_classes: Option<usize>) -> ShapeResult<Tensor> {
    let nc = num_classes.unwrap_or_else(|| labels.iter().max().map_or(0, |m| m + 1));
    let mut out = Tensor::zeros(IxDyn(&[labels.len(), nc]));
    for (i, &label) in labels.iter().enumerate() {
        if label >= nc {
            return Err(ShapeError::DimMismatch { what: "one-hot label", expected: nc, found: label });
        }
        out[[i, label]] = 1.0;
    }
    Ok(out)
}

/// Map labels to ±1: entries equal to `positive` become `+1`, all others `-1`.
pub fn pmone(labels: &Tensor, positive: f64) -> Tensor {
    labels.mapv(|v| if v == positive { 1.0 } else { -1.0 })
}

/// Flip each ±1 label independently with probability `prob`.
///
/// `prob <= 0` returns the labels unchanged; `prob >= 1` flips every label.
pub fn flip_pmone<R: Rng + ?Sized>(labels: &Tensor, prob: f64, rng: &mut R) -> Tensor {
    if prob <= 0.0 {
        return labels.clone();
    }
    let prob = prob.min(1.0);
    labels.mapv(|v| if rng.gen::<f64>() < prob { -v } else { v })
}
