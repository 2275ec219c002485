//! # spectral-kdpp
//!
//! Exact sampling of k-determinantal point processes (k-DPPs) on a finite
//! ground set `{0..N-1}` by the spectral method.
//!
//! # Pipeline
//!
//! 1. **Resolve** ([`resolver`]): derive the likelihood eigenpairs from
//!    whichever kernel representation the [`FiniteDpp`] holds (L, K, dual,
//!    kernel function + data, or cached eigenpairs) and precompute the
//!    elementary symmetric polynomials ([`esp`]).
//! 2. **Select** ([`selector`]): pick exactly k eigenvectors with
//!    probability `∏ λ / e_k(λ)` (Kulesza & Taskar 2012, Algorithm 8).
//!    Projection kernels skip this and keep the eigenvectors with eigenvalue 1
//!    ([`projection`]).
//! 3. **Sample** ([`eigen_samplers`]): draw k items from the projection DPP
//!    spanned by the chosen eigenvectors.
//!
//! [`sampler::spectral_sampler_k_dpp`] runs the whole pipeline and caches the
//! spectral state on the descriptor for subsequent calls.
//!
//! # Logging
//!
//! All stages emit `log` records (info/debug/trace); install any `log`
//! backend (e.g. `env_logger`) to see them.

pub mod dpp;
pub mod eigen_samplers;
pub mod error;
pub mod esp;
pub mod kernel;
pub mod linalg;
pub mod projection;
pub mod resolver;
pub mod sampler;
pub mod selector;

pub use dpp::{FiniteDpp, IntermediateSampleInfo, KernelType};
pub use eigen_samplers::ProjectionMode;
pub use error::{ErrorKind, KdppError, Result};
pub use esp::{
    elementary_symmetric_polynomials, normalized_elementary_symmetric_polynomials, EspTable,
};
pub use kernel::{GaussianKernel, KernelEval};
pub use sampler::{spectral_sampler_k_dpp, vfx_sampler, SamplerConfig, VfxSampler};
pub use selector::{select_eigen_vectors_k_dpp, EigenSelection};

#[cfg(test)]
mod tests;
