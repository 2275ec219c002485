//! Kernel representation resolver.
//!
//! Derives the likelihood eigenvalues `l_eig_vals` and eigenvectors
//! `eig_vecs` of a [`FiniteDpp`] from whatever representation it currently
//! holds. Each step inspects the descriptor, performs exactly one derivation
//! and reports it as a [`Derivation`]; the loop stops on the first terminal
//! step. Chains are short (kernel function → L → eigenpairs at worst) and the
//! loop is bounded by the number of representation kinds.
//!
//! Priority order, first match wins:
//!
//! | # | available                  | derivation                                   |
//! |---|----------------------------|----------------------------------------------|
//! | 1 | `l_eig_vals`               | refresh ESP table if too small, stop         |
//! | 2 | `k_eig_vals`               | `λ_L = λ_K / (1 - λ_K)`                      |
//! | 3 | `l_dual` + `l_gram_factor` | eigh(`L_dual`), `V = Φᵀ W Θ^{-1/2}`          |
//! | 4 | `l`                        | eigh(`L`), clip to `[0, ∞)`                  |
//! | 5 | `k`                        | eigh(`K`), clip to `[0, 1]`                  |
//! | 6 | `eval_l` + `x_data`        | materialise `L`                              |

use log::{debug, info};
use nalgebra::DMatrix;

use crate::dpp::{likelihood_from_correlation_eig_vals, FiniteDpp};
use crate::error::{KdppError, Result};
use crate::esp::normalized_elementary_symmetric_polynomials;
use crate::linalg::{clip_nonnegative, clip_unit, eigh, to_nalgebra};

/// Representation the next derivation step starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    LikelihoodEigen,
    CorrelationEigen,
    Dual,
    Likelihood,
    Correlation,
    KernelEval,
}

impl Representation {
    /// Number of representation kinds; bounds the resolver loop.
    pub const COUNT: usize = 6;

    /// Highest-priority representation currently held by `dpp`.
    pub fn detect(dpp: &FiniteDpp) -> Option<Self> {
        if dpp.l_eig_vals.is_some() {
            Some(Self::LikelihoodEigen)
        } else if dpp.k_eig_vals.is_some() {
            Some(Self::CorrelationEigen)
        } else if dpp.l_dual.is_some() && dpp.l_gram_factor.is_some() {
            Some(Self::Dual)
        } else if dpp.l.is_some() {
            Some(Self::Likelihood)
        } else if dpp.k.is_some() {
            Some(Self::Correlation)
        } else if dpp.eval_l.is_some() && dpp.x_data.is_some() {
            Some(Self::KernelEval)
        } else {
            None
        }
    }
}

/// Outcome of one resolver step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// Likelihood eigenpairs are available. `esp_refreshed` tells whether the
    /// ESP table had to be (re)computed for the requested size.
    Done { esp_refreshed: bool },
    LikelihoodEigFromCorrelationEig,
    LikelihoodEigFromDual,
    LikelihoodEigFromLikelihood,
    CorrelationEigFromCorrelation,
    LikelihoodFromKernelEval,
}

impl Derivation {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Derivation::Done { .. })
    }
}

/// Run resolver steps until likelihood eigenpairs (and, for non-projection
/// kernels, an ESP table covering `size`) are cached on `dpp`.
///
/// Returns the derivations performed, terminal step last.
pub fn compute_spectral_sampler_parameters(
    dpp: &mut FiniteDpp,
    size: usize,
) -> Result<Vec<Derivation>> {
    let mut trail = Vec::with_capacity(Representation::COUNT + 1);

    for _ in 0..=Representation::COUNT {
        let step = compute_spectral_sampler_parameters_step(dpp, size)?;
        trail.push(step);
        if step.is_terminal() {
            info!("Spectral parameters ready after {} step(s): {:?}", trail.len(), trail);
            return Ok(trail);
        }
    }

    Err(KdppError::ResolverDiverged { steps: trail.len() })
}

/// Perform a single derivation step.
pub fn compute_spectral_sampler_parameters_step(
    dpp: &mut FiniteDpp,
    size: usize,
) -> Result<Derivation> {
    let repr = Representation::detect(dpp).ok_or(KdppError::NoRepresentation)?;
    debug!("Resolver step from {:?} (size={})", repr, size);

    match repr {
        Representation::LikelihoodEigen => {
            let eig_vals = dpp.l_eig_vals.as_deref().unwrap_or_default();
            let stale = dpp
                .esp
                .as_ref()
                .map_or(true, |esp| !esp.covers(size, eig_vals.len()));
            let esp_refreshed = !dpp.projection && stale;
            if esp_refreshed {
                dpp.esp = Some(normalized_elementary_symmetric_polynomials(eig_vals, size));
            } else {
                debug!("Reusing cached ESP table");
            }
            Ok(Derivation::Done { esp_refreshed })
        }

        Representation::CorrelationEigen => {
            let k_eig_vals = dpp.k_eig_vals.as_deref().unwrap_or_default();
            dpp.l_eig_vals = Some(likelihood_from_correlation_eig_vals(k_eig_vals)?);
            Ok(Derivation::LikelihoodEigFromCorrelationEig)
        }

        Representation::Dual => {
            let (Some(l_dual), Some(phi)) = (&dpp.l_dual, &dpp.l_gram_factor) else {
                return Err(KdppError::NoRepresentation);
            };
            // L_dual = Φ Φᵀ = W Θ Wᵀ and L = Φᵀ Φ = V Θ Vᵀ with V = Φᵀ W Θ^{-1/2}
            let (mut eig_vals, w) = eigh(&to_nalgebra(l_dual))?;
            clip_nonnegative(&mut eig_vals);

            let phi_t_w = to_nalgebra(phi).transpose() * w;
            // zero-eigenvalue directions have no primal counterpart
            let eig_vecs = DMatrix::from_fn(phi_t_w.nrows(), phi_t_w.ncols(), |r, c| {
                if eig_vals[c] > 0.0 {
                    phi_t_w[(r, c)] / eig_vals[c].sqrt()
                } else {
                    0.0
                }
            });

            dpp.l_eig_vals = Some(eig_vals);
            dpp.eig_vecs = Some(eig_vecs);
            Ok(Derivation::LikelihoodEigFromDual)
        }

        Representation::Likelihood => {
            let l = dpp.l.as_ref().ok_or(KdppError::NoRepresentation)?;
            let (mut eig_vals, eig_vecs) = eigh(&to_nalgebra(l))?;
            clip_nonnegative(&mut eig_vals);
            dpp.l_eig_vals = Some(eig_vals);
            dpp.eig_vecs = Some(eig_vecs);
            Ok(Derivation::LikelihoodEigFromLikelihood)
        }

        Representation::Correlation => {
            let k = dpp.k.as_ref().ok_or(KdppError::NoRepresentation)?;
            let (mut eig_vals, eig_vecs) = eigh(&to_nalgebra(k))?;
            clip_unit(&mut eig_vals);
            dpp.k_eig_vals = Some(eig_vals);
            dpp.eig_vecs = Some(eig_vecs);
            Ok(Derivation::CorrelationEigFromCorrelation)
        }

        Representation::KernelEval => {
            dpp.compute_l()?;
            Ok(Derivation::LikelihoodFromKernelEval)
        }
    }
}
