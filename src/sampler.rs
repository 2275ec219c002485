//! Sampler orchestrator: exact spectral sampling of k-DPPs.
//!
//! ```ignore
//! use rand::{rngs::StdRng, SeedableRng};
//! use spectral_kdpp::{spectral_sampler_k_dpp, FiniteDpp, SamplerConfig};
//!
//! let mut dpp = FiniteDpp::likelihood(l);
//! let mut rng = StdRng::seed_from_u64(42);
//! let sample = spectral_sampler_k_dpp(&mut dpp, 3, &mut rng, &SamplerConfig::default())?;
//! ```
//!
//! Non-projection kernels go through the representation resolver and the
//! Algorithm 8 eigenvector selector. Projection kernels skip the random
//! selection: the eigenvectors with eigenvalue above 0.5 are kept as is.
//! Either way the resulting `N × k` basis is handed to the projection
//! eigenvector sampler registered under `config.mode`.

use log::{debug, info};
use nalgebra::DMatrix;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::dpp::{FiniteDpp, IntermediateSampleInfo};
use crate::eigen_samplers::{select_sampler_eigen_projection, ProjectionMode};
use crate::error::{KdppError, Result};
use crate::kernel::KernelEval;
use crate::linalg::select_columns;
use crate::projection::{compute_spectral_sampler_eig_vals_projection_k_dpp, PROJECTION_THRESHOLD};
use crate::resolver::compute_spectral_sampler_parameters;
use crate::selector::select_eigen_vectors_k_dpp;

/// Sampler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Projection eigenvector sampler, `"GS"` or `"KuTa12"`.
    pub mode: String,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            mode: ProjectionMode::default().to_string(),
        }
    }
}

impl SamplerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }
}

/// Draw an exact sample of size `size` from the k-DPP described by `dpp`.
///
/// Spectral caches on `dpp` are filled on first use and reused afterwards;
/// `dpp.size_k_dpp` records `size` on success.
///
/// # Errors
/// - [`KdppError::NotHermitian`] if `dpp.hermitian` is false (checked first).
/// - [`KdppError::UnknownMode`] if `config.mode` names no registered sampler.
/// - [`KdppError::SizeExceedsRank`] / [`KdppError::ProjectionRankMismatch`]
///   if `size` is incompatible with the kernel.
/// - [`KdppError::UnitCorrelationEigenvalue`] when deriving L eigenvalues from
///   a K eigenvalue equal to 1.
/// - [`KdppError::NoRepresentation`] if the descriptor holds no kernel.
pub fn spectral_sampler_k_dpp<R: RngCore + ?Sized>(
    dpp: &mut FiniteDpp,
    size: usize,
    rng: &mut R,
    config: &SamplerConfig,
) -> Result<Vec<usize>> {
    if !dpp.hermitian {
        return Err(KdppError::NotHermitian);
    }
    let sampler = select_sampler_eigen_projection(&config.mode)?;

    info!(
        "Spectral k-DPP sampler: size={}, projection={}, mode={}",
        size, dpp.projection, config.mode
    );

    let basis = if dpp.projection {
        projection_basis(dpp, size)?
    } else {
        compute_spectral_sampler_parameters(dpp, size)?;
        selected_basis(dpp, size, rng)?
    };
    debug!("Eigenvector basis: {}×{}", basis.nrows(), basis.ncols());

    dpp.size_k_dpp = size;

    let mut rng = rng;
    sampler(&basis, size, &mut rng)
}

fn selected_basis<R: RngCore + ?Sized>(
    dpp: &FiniteDpp,
    size: usize,
    rng: &mut R,
) -> Result<DMatrix<f64>> {
    let (Some(eig_vals), Some(eig_vecs)) = (&dpp.l_eig_vals, &dpp.eig_vecs) else {
        return Err(KdppError::NoRepresentation);
    };
    let selection = select_eigen_vectors_k_dpp(eig_vals, eig_vecs, size, dpp.esp.as_ref(), rng)?;
    debug!("Selected eigenvectors {:?}", selection.indices);
    Ok(selection.vectors)
}

fn projection_basis(dpp: &mut FiniteDpp, size: usize) -> Result<DMatrix<f64>> {
    let eig_vals = compute_spectral_sampler_eig_vals_projection_k_dpp(dpp, size)?;
    let eig_vecs = dpp.eig_vecs.as_ref().ok_or(KdppError::NoRepresentation)?;
    let kept: Vec<usize> = eig_vals
        .iter()
        .enumerate()
        .filter(|(_, v)| **v > PROJECTION_THRESHOLD)
        .map(|(i, _)| i)
        .collect();
    Ok(select_columns(eig_vecs, &kept))
}

/// External vfx sampler: approximate-then-exact sampling driven by a kernel
/// function, carrying its own state between calls.
pub trait VfxSampler {
    fn sample(
        &mut self,
        info: Option<IntermediateSampleInfo>,
        x_data: &DenseMatrix<f64>,
        eval_l: &dyn KernelEval,
        rng: &mut dyn RngCore,
    ) -> Result<(Vec<usize>, Option<IntermediateSampleInfo>)>;
}

/// Run `sampler` on the `(eval_l, x_data)` representation of `dpp`, threading
/// `dpp.intermediate_sample_info` through the call.
pub fn vfx_sampler<R, S>(dpp: &mut FiniteDpp, rng: &mut R, sampler: &mut S) -> Result<Vec<usize>>
where
    R: RngCore + ?Sized,
    S: VfxSampler + ?Sized,
{
    let (Some(eval_l), Some(x_data)) = (&dpp.eval_l, &dpp.x_data) else {
        return Err(KdppError::MissingVfxData);
    };

    let info = dpp.intermediate_sample_info.take();
    debug!("vfx sampler: intermediate info present={}", info.is_some());

    let mut rng = rng;
    let (sample, info) = sampler.sample(info, x_data, &**eval_l, &mut rng)?;
    dpp.intermediate_sample_info = info;
    Ok(sample)
}
