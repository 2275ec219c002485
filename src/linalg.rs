//! Dense linear-algebra bridge.
//!
//! Kernels travel through the public API as smartcore `DenseMatrix<f64>`;
//! decompositions (symmetric eigen, economy QR) run on `nalgebra::DMatrix<f64>`.
//! Conversions happen once per derivation step, never inside the sampling loops.

use log::trace;
use nalgebra::{DMatrix, SymmetricEigen};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::{KdppError, Result};

/// Copy a smartcore matrix into an nalgebra matrix.
pub fn to_nalgebra(m: &DenseMatrix<f64>) -> DMatrix<f64> {
    let (rows, cols) = m.shape();
    DMatrix::from_fn(rows, cols, |i, j| *m.get((i, j)))
}

/// Copy an nalgebra matrix (column-major storage) back into a smartcore matrix.
pub fn to_dense(m: &DMatrix<f64>) -> Result<DenseMatrix<f64>> {
    Ok(DenseMatrix::new(
        m.nrows(),
        m.ncols(),
        m.as_slice().to_vec(),
        true,
    )?)
}

/// Eigendecomposition of a symmetric matrix.
///
/// Eigenvalues are returned in ascending order with eigenvectors stored
/// columnwise in the matching order. Only the lower triangle is read.
pub fn eigh(m: &DMatrix<f64>) -> Result<(Vec<f64>, DMatrix<f64>)> {
    if !m.is_square() {
        return Err(KdppError::Linalg(format!(
            "eigendecomposition needs a square matrix, got {}×{}",
            m.nrows(),
            m.ncols()
        )));
    }
    let n = m.nrows();
    trace!("Symmetric eigendecomposition of {}×{} matrix", n, n);

    let eig = SymmetricEigen::new(m.clone());
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eig.eigenvalues[a].total_cmp(&eig.eigenvalues[b]));

    let vals = order.iter().map(|&i| eig.eigenvalues[i]).collect();
    let vecs = DMatrix::from_fn(n, n, |r, c| eig.eigenvectors[(r, order[c])]);
    Ok((vals, vecs))
}

/// Economy-size Q factor: for an `m×n` input, an `m×min(m, n)` matrix with
/// orthonormal columns spanning the input's column space.
pub fn qr_economic(m: &DMatrix<f64>) -> DMatrix<f64> {
    m.clone().qr().q()
}

/// Clip in place to `[0, ∞)`. Negative values only come from round-off.
pub fn clip_nonnegative(vals: &mut [f64]) {
    vals.iter_mut().for_each(|v| *v = v.max(0.0));
}

/// Clip in place to `[0, 1]`.
pub fn clip_unit(vals: &mut [f64]) {
    vals.iter_mut().for_each(|v| *v = v.clamp(0.0, 1.0));
}

/// Columns of `m` at `indices`, in the given order.
pub fn select_columns(m: &DMatrix<f64>, indices: &[usize]) -> DMatrix<f64> {
    DMatrix::from_fn(m.nrows(), indices.len(), |r, c| m[(r, indices[c])])
}

/// Rebuild `V diag(vals) Vᵀ`.
pub fn reconstruct(vals: &[f64], vecs: &DMatrix<f64>) -> DMatrix<f64> {
    let scaled = DMatrix::from_fn(vecs.nrows(), vecs.ncols(), |r, c| vecs[(r, c)] * vals[c]);
    scaled * vecs.transpose()
}
