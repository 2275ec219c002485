//! Projection eigenvector samplers.
//!
//! Given `V` (`N × r`, orthonormal columns) spanning the subspace chosen by
//! the selector or the projection preparer, draw `size ≤ r` distinct items of
//! the ground set `{0..N-1}` from the projection DPP with kernel `V Vᵀ`.
//! Items are returned in the order they were drawn.
//!
//! Two interchangeable algorithms are registered under [`ProjectionMode`]:
//!
//! - `GS`: chain rule where conditionals are updated by incremental
//!   Gram–Schmidt on the rows of `V`. `O(N r size)`.
//! - `KuTa12`: Kulesza & Taskar (2012) Algorithm 1, phase 2. After each draw
//!   the basis is restricted to vectors vanishing on the drawn item and
//!   re-orthonormalised.

use std::fmt;
use std::str::FromStr;

use log::{debug, trace};
use nalgebra::DMatrix;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{KdppError, Result};
use crate::linalg::qr_economic;

/// Signature every registered projection sampler implements.
pub type ProjectionEigenSampler = fn(&DMatrix<f64>, usize, &mut dyn RngCore) -> Result<Vec<usize>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectionMode {
    #[default]
    #[serde(rename = "GS")]
    Gs,
    #[serde(rename = "KuTa12")]
    KuTa12,
}

impl ProjectionMode {
    pub fn sampler(self) -> ProjectionEigenSampler {
        match self {
            ProjectionMode::Gs => proj_dpp_sampler_eig_gs,
            ProjectionMode::KuTa12 => proj_dpp_sampler_eig_kuta12,
        }
    }
}

impl FromStr for ProjectionMode {
    type Err = KdppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "GS" => Ok(ProjectionMode::Gs),
            "KuTa12" => Ok(ProjectionMode::KuTa12),
            other => Err(KdppError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for ProjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionMode::Gs => write!(f, "GS"),
            ProjectionMode::KuTa12 => write!(f, "KuTa12"),
        }
    }
}

/// Resolve a mode string to its sampler.
pub fn select_sampler_eigen_projection(mode: &str) -> Result<ProjectionEigenSampler> {
    Ok(mode.parse::<ProjectionMode>()?.sampler())
}

fn check_size(eig_vecs: &DMatrix<f64>, size: usize) -> Result<()> {
    let rank = eig_vecs.ncols();
    if size > rank {
        return Err(KdppError::SizeExceedsRank { size, rank });
    }
    Ok(())
}

/// Draw an index with probability proportional to `weights` (non-negative).
fn draw_index(weights: &[f64], rng: &mut dyn RngCore) -> Result<usize> {
    let total: f64 = weights.iter().sum();
    if !(total > 0.0) {
        return Err(KdppError::Linalg(
            "projection sampler ran out of probability mass".to_string(),
        ));
    }
    let u = rng.random::<f64>() * total;
    let mut acc = 0.0;
    let mut last = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        acc += w;
        last = i;
        if u < acc {
            return Ok(i);
        }
    }
    Ok(last)
}

fn row_sq_norms(m: &DMatrix<f64>) -> Vec<f64> {
    (0..m.nrows()).map(|i| m.row(i).norm_squared()).collect()
}

/// Chain-rule sampler with incremental Gram–Schmidt updates.
pub fn proj_dpp_sampler_eig_gs(
    eig_vecs: &DMatrix<f64>,
    size: usize,
    rng: &mut dyn RngCore,
) -> Result<Vec<usize>> {
    check_size(eig_vecs, size)?;
    let n = eig_vecs.nrows();
    debug!("GS projection sampler: N={}, r={}, size={}", n, eig_vecs.ncols(), size);

    // residual squared norms: conditional inclusion weights
    let mut norms_2 = row_sq_norms(eig_vecs);
    let mut avail = vec![true; n];
    let mut c = DMatrix::<f64>::zeros(n, size);
    let mut sample = Vec::with_capacity(size);

    for it in 0..size {
        let weights: Vec<f64> = norms_2
            .iter()
            .zip(&avail)
            .map(|(&w, &a)| if a { w.abs() } else { 0.0 })
            .collect();
        let j = draw_index(&weights, rng)?;
        trace!("GS draw {}: item {} (weight {:.6})", it, j, weights[j]);
        sample.push(j);
        avail[j] = false;

        let norm_j = norms_2[j].sqrt();
        for i in (0..n).filter(|&i| avail[i]) {
            let projected: f64 = (0..it).map(|t| c[(i, t)] * c[(j, t)]).sum();
            let coef = (eig_vecs.row(i).dot(&eig_vecs.row(j)) - projected) / norm_j;
            c[(i, it)] = coef;
            norms_2[i] -= coef * coef;
        }
    }

    Ok(sample)
}

/// Kulesza–Taskar phase-2 sampler: draw, restrict the basis, re-orthonormalise.
pub fn proj_dpp_sampler_eig_kuta12(
    eig_vecs: &DMatrix<f64>,
    size: usize,
    rng: &mut dyn RngCore,
) -> Result<Vec<usize>> {
    check_size(eig_vecs, size)?;
    debug!(
        "KuTa12 projection sampler: N={}, r={}, size={}",
        eig_vecs.nrows(),
        eig_vecs.ncols(),
        size
    );

    let mut basis = eig_vecs.clone();
    let mut sample = Vec::with_capacity(size);

    for it in 0..size {
        let j = draw_index(&row_sq_norms(&basis), rng)?;
        trace!("KuTa12 draw {}: item {}", it, j);
        sample.push(j);
        if it + 1 == size {
            break;
        }

        // pivot on the coordinate with largest magnitude in row j
        let mut pivot = 0;
        for c in 1..basis.ncols() {
            if basis[(j, c)].abs() > basis[(j, pivot)].abs() {
                pivot = c;
            }
        }
        let pivot_col: Vec<f64> = basis.column(pivot).iter().copied().collect();
        let pivot_val = basis[(j, pivot)];

        for c in (0..basis.ncols()).filter(|&c| c != pivot) {
            let factor = basis[(j, c)] / pivot_val;
            for (r, p) in pivot_col.iter().enumerate() {
                basis[(r, c)] -= p * factor;
            }
        }

        basis = qr_economic(&basis.remove_column(pivot));
    }

    Ok(sample)
}
