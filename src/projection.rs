//! Eigenvalue preparation for projection k-DPPs.
//!
//! A projection kernel has eigenvalues exactly 0 or 1, so no Bernoulli
//! selection is needed: the eigenvectors with eigenvalue above 0.5 already
//! span the sampling subspace. That subspace has a fixed dimension and the
//! requested size must match it.

use log::{debug, warn};
use smartcore::linalg::basic::arrays::Array;

use crate::dpp::{FiniteDpp, KernelType};
use crate::error::{KdppError, Result};
use crate::linalg::{clip_unit, eigh, qr_economic, to_nalgebra};
use crate::resolver::compute_spectral_sampler_parameters;

/// Eigenvalues above this are treated as 1, the rest as 0.
pub const PROJECTION_THRESHOLD: f64 = 0.5;

/// Eigenvalues of a projection DPP, to be thresholded at
/// [`PROJECTION_THRESHOLD`]. Eigenvectors are cached in `dpp.eig_vecs`.
///
/// # Errors
/// - [`KdppError::NotProjection`] if `dpp.projection` is false.
/// - [`KdppError::ProjectionRankMismatch`] if the kernel's rank differs from
///   `size`.
pub fn compute_spectral_sampler_eig_vals_projection_k_dpp(
    dpp: &mut FiniteDpp,
    size: usize,
) -> Result<Vec<f64>> {
    if !dpp.projection {
        return Err(KdppError::NotProjection);
    }

    match dpp.kernel_type {
        KernelType::Likelihood => {
            compute_spectral_sampler_parameters(dpp, size)?;
            let eig_vals = dpp.l_eig_vals.clone().ok_or(KdppError::NoRepresentation)?;
            let rank = eig_vals.iter().filter(|&&v| v > PROJECTION_THRESHOLD).count();
            debug!("Projection L: rank={}, requested size={}", rank, size);
            if size != rank {
                return Err(KdppError::ProjectionRankMismatch { size, rank });
            }
            Ok(eig_vals)
        }
        KernelType::Correlation => prepare_correlation(dpp, size),
    }
}

fn prepare_correlation(dpp: &mut FiniteDpp, size: usize) -> Result<Vec<f64>> {
    let rank = projection_correlation_rank(dpp)?;
    debug!("Projection K: rank={}, requested size={}", rank, size);
    if size != rank {
        return Err(KdppError::ProjectionRankMismatch { size, rank });
    }

    if let Some(vals) = &dpp.k_eig_vals {
        return Ok(vals.clone());
    }

    if let Some(a_zono) = &dpp.a_zono {
        warn!("DPP defined via a_zono is meant for MCMC sampling, but exact sampling was requested");
        let q = qr_economic(&to_nalgebra(a_zono).transpose());
        dpp.eig_vecs = Some(q);
        dpp.k_eig_vals = Some(vec![1.0; rank]);
        return Ok(vec![1.0; rank]);
    }

    dpp.compute_k()?;
    let k = dpp.k.as_ref().ok_or(KdppError::NoRepresentation)?;
    let (mut eig_vals, eig_vecs) = eigh(&to_nalgebra(k))?;
    clip_unit(&mut eig_vals);
    dpp.eig_vecs = Some(eig_vecs);
    dpp.k_eig_vals = Some(eig_vals.clone());
    Ok(eig_vals)
}

/// Rank of a projection correlation kernel: rounded sum of cached
/// eigenvalues, else rows of `a_zono`, else rounded trace of `K`.
fn projection_correlation_rank(dpp: &mut FiniteDpp) -> Result<usize> {
    if let Some(vals) = &dpp.k_eig_vals {
        return Ok(vals.iter().sum::<f64>().round_ties_even().max(0.0) as usize);
    }
    if let Some(a_zono) = &dpp.a_zono {
        return Ok(a_zono.shape().0);
    }

    dpp.compute_k()?;
    let k = dpp.k.as_ref().ok_or(KdppError::NoRepresentation)?;
    let (n, _) = k.shape();
    let trace: f64 = (0..n).map(|i| *k.get((i, i))).sum();
    Ok(trace.round_ties_even().max(0.0) as usize)
}
