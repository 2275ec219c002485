//! Eigenvector selection for k-DPPs (Kulesza & Taskar 2012, Algorithm 8).
//!
//! A k-DPP with likelihood eigenvalues `λ_1..λ_N` is a mixture of projection
//! DPPs: the eigenvector subset `S`, `|S| = k`, is chosen with probability
//! `∏_{n∈S} λ_n / e_k(λ_1..λ_N)`. The selection walks the eigenvalues
//! backwards, flipping one biased coin per index:
//!
//! ```text
//! P(include n-1 | budget b) = λ_{n-1} · e_{b-1}(λ_1..λ_{n-1}) / e_b(λ_1..λ_n)
//! ```
//!
//! Random draws are consumed strictly from index N-1 down to 0, one per
//! visited index, so a seeded generator reproduces the same selection.

use std::borrow::Cow;

use log::{debug, trace};
use nalgebra::DMatrix;
use rand::Rng;

use crate::error::{KdppError, Result};
use crate::esp::{normalized_elementary_symmetric_polynomials, EspTable};
use crate::linalg::select_columns;

/// Selected eigenvectors.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenSelection {
    /// Selected eigenvalue indices, ascending.
    pub indices: Vec<usize>,
    /// Matching eigenvector columns, `N × k`.
    pub vectors: DMatrix<f64>,
}

/// Number of eigenvalues above `max(λ) · n · ε`, as in `numpy.linalg.matrix_rank`.
pub fn numerical_rank(eig_vals: &[f64], n: usize) -> usize {
    let max = eig_vals.iter().copied().fold(0.0_f64, f64::max);
    let tol = max * (n as f64 * f64::EPSILON);
    eig_vals.iter().filter(|&&v| v > tol).count()
}

/// Select `size` columns of `eig_vecs` by Algorithm 8.
///
/// `esp` is reused when it covers `size` over all of `eig_vals`, otherwise a
/// table over `λ / max(λ)` is computed for this call only.
///
/// # Errors
/// - [`KdppError::SizeExceedsRank`] if `size` exceeds the numerical rank of
///   the eigenvalues.
/// - [`KdppError::Linalg`] if an inclusion probability is not finite.
pub fn select_eigen_vectors_k_dpp<R: Rng + ?Sized>(
    eig_vals: &[f64],
    eig_vecs: &DMatrix<f64>,
    size: usize,
    esp: Option<&EspTable>,
    rng: &mut R,
) -> Result<EigenSelection> {
    let rank = numerical_rank(eig_vals, eig_vecs.nrows());
    if size > rank {
        return Err(KdppError::SizeExceedsRank { size, rank });
    }
    if eig_vecs.ncols() != eig_vals.len() {
        return Err(KdppError::Linalg(format!(
            "{} eigenvalues but {} eigenvector columns",
            eig_vals.len(),
            eig_vecs.ncols()
        )));
    }

    let esp: Cow<'_, EspTable> = match esp {
        Some(table) if table.covers(size, eig_vals.len()) => Cow::Borrowed(table),
        _ => Cow::Owned(normalized_elementary_symmetric_polynomials(eig_vals, size)),
    };

    debug!(
        "Selecting {} of {} eigenvectors (rank={})",
        size,
        eig_vals.len(),
        rank
    );

    let mut budget = size;
    let mut mask = vec![0usize; size];
    if budget > 0 {
        for n in (1..=eig_vals.len()).rev() {
            let u: f64 = rng.random();
            let p = inclusion_probability(eig_vals[n - 1], &esp, budget, n)?;
            trace!("n={} budget={} u={:.6} p={:.6}", n, budget, u, p);
            if u < p {
                budget -= 1;
                mask[budget] = n - 1;
                if budget == 0 {
                    break;
                }
            }
        }
    }

    if budget != 0 {
        return Err(KdppError::SizeExceedsRank {
            size,
            rank: size - budget,
        });
    }

    Ok(EigenSelection {
        vectors: select_columns(eig_vecs, &mask),
        indices: mask,
    })
}

/// `λ_{n-1} · e_{b-1}(λ_1..λ_{n-1}) / e_b(λ_1..λ_n)`, read in the table's scale.
fn inclusion_probability(lambda: f64, esp: &EspTable, budget: usize, n: usize) -> Result<f64> {
    let (Some(prev), Some(cur)) = (esp.get(budget - 1, n - 1), esp.get(budget, n)) else {
        return Err(KdppError::Linalg(format!(
            "ESP table of order {} over {} values cannot serve budget {} at index {}",
            esp.size(),
            esp.n(),
            budget,
            n
        )));
    };
    let p = lambda / esp.scale() * prev / cur;
    if !p.is_finite() {
        return Err(KdppError::Linalg(format!(
            "non-finite inclusion probability at index {} (e_{}={:e}, e_{}={:e})",
            n - 1,
            budget - 1,
            prev,
            budget,
            cur
        )));
    }
    Ok(p)
}
