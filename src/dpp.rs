//! Finite DPP descriptor.
//!
//! A [`FiniteDpp`] holds whichever algebraic representation of the kernel the
//! caller knows (likelihood `L`, correlation `K`, dual/Gram pair, kernel
//! function plus data, zonotope generator) together with the spectral caches
//! the sampling pipeline fills in. The descriptor is long-lived: caches are
//! reused across sampling calls and only the ESP table is refreshed when a
//! larger sample size is requested.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use log::{debug, info};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::{KdppError, Result};
use crate::esp::EspTable;
use crate::kernel::KernelEval;
use crate::linalg::{clip_nonnegative, clip_unit, eigh, qr_economic, reconstruct, to_dense, to_nalgebra};

/// Opaque state threaded through successive vfx sampling calls.
pub type IntermediateSampleInfo = Box<dyn Any + Send>;

/// Which kernel a projection DPP is parametrised by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KernelType {
    #[default]
    Likelihood,
    Correlation,
}

/// A finite DPP over `N` items: its known kernel representations plus the
/// spectral caches filled by [`compute_spectral_sampler_parameters`].
///
/// [`compute_spectral_sampler_parameters`]: crate::resolver::compute_spectral_sampler_parameters
pub struct FiniteDpp {
    pub hermitian: bool,
    pub projection: bool,
    pub kernel_type: KernelType,

    // ── representations ──────────────────────────────────────────────────
    pub l: Option<DenseMatrix<f64>>,
    pub k: Option<DenseMatrix<f64>>,
    /// `Φ Φᵀ`, paired with `l_gram_factor = Φ` so that `L = Φᵀ Φ`.
    pub l_dual: Option<DenseMatrix<f64>>,
    pub l_gram_factor: Option<DenseMatrix<f64>>,
    pub eval_l: Option<Arc<dyn KernelEval>>,
    /// One data point per row.
    pub x_data: Option<DenseMatrix<f64>>,
    pub a_zono: Option<DenseMatrix<f64>>,

    // ── caches filled by the pipeline ────────────────────────────────────
    pub l_eig_vals: Option<Vec<f64>>,
    pub k_eig_vals: Option<Vec<f64>>,
    /// Eigenvectors stored columnwise, matching whichever eigenvalues are set.
    pub eig_vecs: Option<DMatrix<f64>>,
    pub esp: Option<EspTable>,
    pub size_k_dpp: usize,
    pub intermediate_sample_info: Option<IntermediateSampleInfo>,
}

impl FiniteDpp {
    fn empty(kernel_type: KernelType) -> Self {
        Self {
            hermitian: true,
            projection: false,
            kernel_type,
            l: None,
            k: None,
            l_dual: None,
            l_gram_factor: None,
            eval_l: None,
            x_data: None,
            a_zono: None,
            l_eig_vals: None,
            k_eig_vals: None,
            eig_vecs: None,
            esp: None,
            size_k_dpp: 0,
            intermediate_sample_info: None,
        }
    }

    /// DPP(L) from a dense likelihood kernel.
    pub fn likelihood(l: DenseMatrix<f64>) -> Self {
        Self {
            l: Some(l),
            ..Self::empty(KernelType::Likelihood)
        }
    }

    /// DPP(K) from a dense correlation kernel.
    pub fn correlation(k: DenseMatrix<f64>) -> Self {
        Self {
            k: Some(k),
            ..Self::empty(KernelType::Correlation)
        }
    }

    /// DPP(L) with `L = Φᵀ Φ`, stored through the dual kernel `Φ Φᵀ`.
    pub fn likelihood_dual(phi: DenseMatrix<f64>) -> Result<Self> {
        let phi_na = to_nalgebra(&phi);
        let dual = &phi_na * phi_na.transpose();
        debug!(
            "Dual kernel: Φ is {}×{}, L_dual is {}×{}",
            phi_na.nrows(),
            phi_na.ncols(),
            dual.nrows(),
            dual.ncols()
        );
        Ok(Self {
            l_dual: Some(to_dense(&dual)?),
            l_gram_factor: Some(phi),
            ..Self::empty(KernelType::Likelihood)
        })
    }

    /// DPP(L) where `L[i][j] = eval_l(x_i, x_j)` over the rows of `x_data`.
    pub fn likelihood_eval(eval_l: Arc<dyn KernelEval>, x_data: DenseMatrix<f64>) -> Self {
        Self {
            eval_l: Some(eval_l),
            x_data: Some(x_data),
            ..Self::empty(KernelType::Likelihood)
        }
    }

    /// DPP(L) given its eigendecomposition.
    pub fn likelihood_eig(eig_vals: Vec<f64>, eig_vecs: DenseMatrix<f64>) -> Self {
        Self {
            l_eig_vals: Some(eig_vals),
            eig_vecs: Some(to_nalgebra(&eig_vecs)),
            ..Self::empty(KernelType::Likelihood)
        }
    }

    /// DPP(K) given its eigendecomposition.
    pub fn correlation_eig(eig_vals: Vec<f64>, eig_vecs: DenseMatrix<f64>) -> Self {
        Self {
            k_eig_vals: Some(eig_vals),
            eig_vecs: Some(to_nalgebra(&eig_vecs)),
            ..Self::empty(KernelType::Correlation)
        }
    }

    /// Projection DPP(K) with `K = Aᵀ (A Aᵀ)⁻¹ A`, rank = rows of `a_zono`.
    pub fn zonotope(a_zono: DenseMatrix<f64>) -> Self {
        Self {
            a_zono: Some(a_zono),
            projection: true,
            ..Self::empty(KernelType::Correlation)
        }
    }

    pub fn with_projection(mut self, projection: bool) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_hermitian(mut self, hermitian: bool) -> Self {
        self.hermitian = hermitian;
        self
    }

    /// Size of the ground set, read from the first representation that knows it.
    pub fn ground_set_size(&self) -> Option<usize> {
        if let Some(v) = &self.eig_vecs {
            return Some(v.nrows());
        }
        [&self.l, &self.k, &self.l_gram_factor, &self.a_zono]
            .into_iter()
            .flatten()
            .map(|m| m.shape().1)
            .next()
            .or_else(|| self.x_data.as_ref().map(|x| x.shape().0))
    }

    /// Materialise the dense likelihood kernel into the `l` slot.
    pub fn compute_l(&mut self) -> Result<()> {
        if self.l.is_some() {
            return Ok(());
        }

        let l = if let (Some(vals), Some(vecs)) = (&self.l_eig_vals, &self.eig_vecs) {
            debug!("compute_l: from cached L eigendecomposition");
            reconstruct(vals, vecs)
        } else if let Some(phi) = &self.l_gram_factor {
            debug!("compute_l: L = Φᵀ Φ");
            let phi = to_nalgebra(phi);
            phi.transpose() * phi
        } else if let (Some(eval_l), Some(x)) = (&self.eval_l, &self.x_data) {
            debug!("compute_l: evaluating kernel pairwise over x_data");
            to_nalgebra(&eval_l.gram(x)?)
        } else if let (Some(vals), Some(vecs)) = (&self.k_eig_vals, &self.eig_vecs) {
            debug!("compute_l: from cached K eigendecomposition");
            reconstruct(&likelihood_from_correlation_eig_vals(vals)?, vecs)
        } else if let Some(k) = &self.k {
            debug!("compute_l: L = K (I - K)⁻¹");
            let (mut vals, vecs) = eigh(&to_nalgebra(k))?;
            clip_unit(&mut vals);
            reconstruct(&likelihood_from_correlation_eig_vals(&vals)?, &vecs)
        } else {
            return Err(KdppError::NoRepresentation);
        };

        self.l = Some(to_dense(&l)?);
        Ok(())
    }

    /// Materialise the dense correlation kernel into the `k` slot.
    pub fn compute_k(&mut self) -> Result<()> {
        if self.k.is_some() {
            return Ok(());
        }

        let k = if let (Some(vals), Some(vecs)) = (&self.k_eig_vals, &self.eig_vecs) {
            debug!("compute_k: from cached K eigendecomposition");
            reconstruct(vals, vecs)
        } else if let Some(a) = &self.a_zono {
            debug!("compute_k: K = Aᵀ (A Aᵀ)⁻¹ A via QR of Aᵀ");
            let q = qr_economic(&to_nalgebra(a).transpose());
            &q * q.transpose()
        } else if let (Some(vals), Some(vecs)) = (&self.l_eig_vals, &self.eig_vecs) {
            debug!("compute_k: from cached L eigendecomposition");
            reconstruct(&correlation_from_likelihood_eig_vals(vals), vecs)
        } else {
            self.compute_l()?;
            let l = self.l.as_ref().ok_or(KdppError::NoRepresentation)?;
            debug!("compute_k: K = L (I + L)⁻¹");
            let (mut vals, vecs) = eigh(&to_nalgebra(l))?;
            clip_nonnegative(&mut vals);
            reconstruct(&correlation_from_likelihood_eig_vals(&vals), &vecs)
        };

        info!("Correlation kernel materialised ({}×{})", k.nrows(), k.ncols());
        self.k = Some(to_dense(&k)?);
        Ok(())
    }
}

/// `λ_L = λ_K / (1 - λ_K)`; a K eigenvalue of exactly 1 is rejected.
pub fn likelihood_from_correlation_eig_vals(k_eig_vals: &[f64]) -> Result<Vec<f64>> {
    k_eig_vals
        .iter()
        .enumerate()
        .map(|(index, &v)| {
            let denom = 1.0 - v;
            if denom == 0.0 {
                Err(KdppError::UnitCorrelationEigenvalue { index })
            } else {
                Ok(v / denom)
            }
        })
        .collect()
}

/// `λ_K = λ_L / (1 + λ_L)`.
pub fn correlation_from_likelihood_eig_vals(l_eig_vals: &[f64]) -> Vec<f64> {
    l_eig_vals.iter().map(|&v| v / (1.0 + v)).collect()
}

impl fmt::Debug for FiniteDpp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = |m: &Option<DenseMatrix<f64>>| m.as_ref().map(|m| m.shape());
        f.debug_struct("FiniteDpp")
            .field("hermitian", &self.hermitian)
            .field("projection", &self.projection)
            .field("kernel_type", &self.kernel_type)
            .field("l", &shape(&self.l))
            .field("k", &shape(&self.k))
            .field("l_dual", &shape(&self.l_dual))
            .field("l_gram_factor", &shape(&self.l_gram_factor))
            .field("eval_l", &self.eval_l.is_some())
            .field("x_data", &shape(&self.x_data))
            .field("a_zono", &shape(&self.a_zono))
            .field("l_eig_vals", &self.l_eig_vals)
            .field("k_eig_vals", &self.k_eig_vals)
            .field("eig_vecs", &self.eig_vecs.as_ref().map(|v| v.shape()))
            .field("esp", &self.esp.as_ref().map(|e| e.size()))
            .field("size_k_dpp", &self.size_k_dpp)
            .field(
                "intermediate_sample_info",
                &self.intermediate_sample_info.is_some(),
            )
            .finish()
    }
}
