//! Error type shared by every stage of the sampling pipeline.
//!
//! Every failure is deterministic given the descriptor contents, so nothing
//! here is retried: errors surface synchronously to the caller of
//! [`spectral_sampler_k_dpp`](crate::sampler::spectral_sampler_k_dpp).

use thiserror::Error;

/// Coarse classification of a [`KdppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed descriptor or sampler configuration.
    Configuration,
    /// Requested sample size incompatible with the kernel rank.
    Size,
    /// A correlation eigenvalue of exactly 1 has no finite likelihood eigenvalue.
    Division,
    /// A precondition on the descriptor flags does not hold.
    Precondition,
    /// Numerical backend failure (shape mismatch, decomposition failure).
    Linalg,
}

#[derive(Debug, Error)]
pub enum KdppError {
    #[error("sampler requires a hermitian kernel (dpp.hermitian = false)")]
    NotHermitian,

    #[error("operation requires a projection kernel (dpp.projection = false)")]
    NotProjection,

    #[error("none of the available samplers could be used based on the current DPP representation")]
    NoRepresentation,

    #[error("representation resolver did not reach a fixed point after {steps} steps")]
    ResolverDiverged { steps: usize },

    #[error("unknown projection eigenvector sampler mode {0:?} (expected \"GS\" or \"KuTa12\")")]
    UnknownMode(String),

    #[error("the vfx sampler is only available with the (eval_l, x_data) representation")]
    MissingVfxData,

    #[error("size k={size} > rank(L)={rank}")]
    SizeExceedsRank { size: usize, rank: usize },

    #[error(
        "k-DPP(K) with projection correlation kernel is only defined for k = rank(K), here k={size} != rank={rank}"
    )]
    ProjectionRankMismatch { size: usize, rank: usize },

    #[error("K eigenvalue[{index}] is exactly 1, the matching L eigenvalue is infinite")]
    UnitCorrelationEigenvalue { index: usize },

    #[error("linear algebra: {0}")]
    Linalg(String),
}

impl KdppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KdppError::NotHermitian | KdppError::NotProjection => ErrorKind::Precondition,
            KdppError::NoRepresentation
            | KdppError::ResolverDiverged { .. }
            | KdppError::UnknownMode(_)
            | KdppError::MissingVfxData => ErrorKind::Configuration,
            KdppError::SizeExceedsRank { .. } | KdppError::ProjectionRankMismatch { .. } => {
                ErrorKind::Size
            }
            KdppError::UnitCorrelationEigenvalue { .. } => ErrorKind::Division,
            KdppError::Linalg(_) => ErrorKind::Linalg,
        }
    }
}

impl From<smartcore::error::Failed> for KdppError {
    fn from(err: smartcore::error::Failed) -> Self {
        KdppError::Linalg(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KdppError>;
