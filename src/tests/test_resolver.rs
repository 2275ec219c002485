//! Representation resolver: derivation chains, caching, clipping.

use std::sync::Arc;

use approx::{assert_relative_eq, relative_eq};
use rand::rngs::StdRng;
use rand::SeedableRng;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::dpp::{correlation_from_likelihood_eig_vals, likelihood_from_correlation_eig_vals, FiniteDpp};
use crate::error::ErrorKind;
use crate::kernel::GaussianKernel;
use crate::linalg::{reconstruct, to_nalgebra};
use crate::resolver::{compute_spectral_sampler_parameters, Derivation, Representation};
use crate::selector::select_eigen_vectors_k_dpp;
use crate::tests::{init, kernel_from_spectrum, random_orthonormal};

#[test]
fn test_resolve_from_likelihood() {
    init();
    let v = random_orthonormal(4, 4, 7);
    let mut dpp = FiniteDpp::likelihood(kernel_from_spectrum(&[4.0, 0.5, 2.0, 1.0], &v));

    let trail = compute_spectral_sampler_parameters(&mut dpp, 2).unwrap();
    assert_eq!(
        trail,
        vec![
            Derivation::LikelihoodEigFromLikelihood,
            Derivation::Done { esp_refreshed: true }
        ]
    );

    let vals = dpp.l_eig_vals.as_ref().unwrap();
    for (got, want) in vals.iter().zip([0.5, 1.0, 2.0, 4.0]) {
        assert_relative_eq!(*got, want, epsilon = 1e-10);
    }
    assert_eq!(dpp.eig_vecs.as_ref().unwrap().shape(), (4, 4));
    assert_eq!(dpp.esp.as_ref().unwrap().size(), 2);
}

#[test]
fn test_resolver_caches_eigenpairs_and_refreshes_esp() {
    init();
    let v = random_orthonormal(5, 5, 11);
    let mut dpp = FiniteDpp::likelihood(kernel_from_spectrum(&[1.0, 2.0, 3.0, 4.0, 5.0], &v));

    compute_spectral_sampler_parameters(&mut dpp, 2).unwrap();
    let vals_ptr = dpp.l_eig_vals.as_ref().unwrap().as_ptr();
    let vecs_ptr = dpp.eig_vecs.as_ref().unwrap().as_slice().as_ptr();
    let vals_before = dpp.l_eig_vals.clone();

    // same size: nothing to do
    let trail = compute_spectral_sampler_parameters(&mut dpp, 2).unwrap();
    assert_eq!(trail, vec![Derivation::Done { esp_refreshed: false }]);

    // larger size: ESP refreshed, eigenpairs untouched
    let trail = compute_spectral_sampler_parameters(&mut dpp, 4).unwrap();
    assert_eq!(trail, vec![Derivation::Done { esp_refreshed: true }]);
    assert_eq!(dpp.esp.as_ref().unwrap().size(), 4);

    // smaller size is covered by the larger table
    let trail = compute_spectral_sampler_parameters(&mut dpp, 3).unwrap();
    assert_eq!(trail, vec![Derivation::Done { esp_refreshed: false }]);

    assert_eq!(dpp.l_eig_vals.as_ref().unwrap().as_ptr(), vals_ptr);
    assert_eq!(dpp.eig_vecs.as_ref().unwrap().as_slice().as_ptr(), vecs_ptr);
    assert_eq!(dpp.l_eig_vals, vals_before);
}

#[test]
fn test_resolve_from_correlation() {
    init();
    let v = random_orthonormal(3, 3, 3);
    let mut dpp = FiniteDpp::correlation(kernel_from_spectrum(&[0.2, 0.5, 0.75], &v));

    let trail = compute_spectral_sampler_parameters(&mut dpp, 1).unwrap();
    assert_eq!(
        trail,
        vec![
            Derivation::CorrelationEigFromCorrelation,
            Derivation::LikelihoodEigFromCorrelationEig,
            Derivation::Done { esp_refreshed: true }
        ]
    );

    let l_vals = dpp.l_eig_vals.as_ref().unwrap();
    for (got, want) in l_vals.iter().zip([0.25, 1.0, 3.0]) {
        assert_relative_eq!(*got, want, epsilon = 1e-9);
    }
}

#[test]
fn test_unit_correlation_eigenvalue_is_division_error() {
    init();
    let v = random_orthonormal(3, 3, 5);
    let mut dpp = FiniteDpp::correlation_eig(vec![0.3, 1.0, 0.6], crate::linalg::to_dense(&v).unwrap());

    let err = compute_spectral_sampler_parameters(&mut dpp, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Division);
    assert!(dpp.l_eig_vals.is_none());
}

#[test]
fn test_correlation_likelihood_round_trip() {
    init();
    let k_vals = vec![1e-6, 0.1, 0.5, 0.9, 0.999];
    let l_vals = likelihood_from_correlation_eig_vals(&k_vals).unwrap();
    let back = correlation_from_likelihood_eig_vals(&l_vals);
    for (a, b) in k_vals.iter().zip(&back) {
        assert!(relative_eq!(*a, *b, max_relative = 1e-12));
    }
}

#[test]
fn test_resolve_from_dual() {
    init();
    // Φ is 2×4: L = ΦᵀΦ is 4×4 of rank 2
    let phi = DenseMatrix::from_2d_vec(&vec![
        vec![1.0, 0.5, -0.3, 0.2],
        vec![0.0, 1.2, 0.4, -0.7],
    ])
    .unwrap();
    let phi_na = to_nalgebra(&phi);
    let l = phi_na.transpose() * &phi_na;

    let mut dpp = FiniteDpp::likelihood_dual(phi).unwrap();
    let trail = compute_spectral_sampler_parameters(&mut dpp, 2).unwrap();
    assert_eq!(trail[0], Derivation::LikelihoodEigFromDual);

    let vals = dpp.l_eig_vals.as_ref().unwrap();
    let vecs = dpp.eig_vecs.as_ref().unwrap();
    assert_eq!(vals.len(), 2);
    assert_eq!(vecs.shape(), (4, 2));

    let rebuilt = reconstruct(vals, vecs);
    for i in 0..4 {
        for j in 0..4 {
            assert_relative_eq!(rebuilt[(i, j)], l[(i, j)], epsilon = 1e-10);
        }
    }
    // primal eigenvectors are orthonormal
    let gram = vecs.transpose() * vecs;
    assert_relative_eq!(gram[(0, 0)], 1.0, epsilon = 1e-10);
    assert_relative_eq!(gram[(1, 1)], 1.0, epsilon = 1e-10);
    assert_relative_eq!(gram[(0, 1)], 0.0, epsilon = 1e-10);
}

#[test]
fn test_resolve_from_kernel_function() {
    init();
    let x = DenseMatrix::from_2d_vec(&vec![
        vec![0.0, 0.0],
        vec![1.0, 0.0],
        vec![0.0, 2.0],
        vec![3.0, 1.0],
    ])
    .unwrap();
    let mut dpp = FiniteDpp::likelihood_eval(Arc::new(GaussianKernel::new(1.0)), x);

    let trail = compute_spectral_sampler_parameters(&mut dpp, 2).unwrap();
    assert_eq!(
        trail,
        vec![
            Derivation::LikelihoodFromKernelEval,
            Derivation::LikelihoodEigFromLikelihood,
            Derivation::Done { esp_refreshed: true }
        ]
    );
    assert!(dpp.l.is_some());
    // Gaussian Gram matrix of distinct points is positive definite
    assert!(dpp.l_eig_vals.as_ref().unwrap().iter().all(|&v| v > 0.0));
}

#[test]
fn test_closure_kernel() {
    init();
    let x = DenseMatrix::from_2d_vec(&vec![vec![1.0], vec![2.0], vec![3.0]]).unwrap();
    let linear = |a: &[f64], b: &[f64]| a.iter().zip(b).map(|(p, q)| p * q).sum::<f64>();
    let mut dpp = FiniteDpp::likelihood_eval(Arc::new(linear), x);

    compute_spectral_sampler_parameters(&mut dpp, 1).unwrap();
    let vals = dpp.l_eig_vals.as_ref().unwrap();
    // rank-one kernel xxᵀ with ‖x‖² = 14
    assert_relative_eq!(vals[2], 14.0, epsilon = 1e-9);
    assert!(vals[0].abs() < 1e-9 && vals[1].abs() < 1e-9);
}

#[test]
fn test_negative_noise_eigenvalue_is_clipped() {
    init();
    let v = random_orthonormal(3, 3, 21);
    let mut dpp = FiniteDpp::likelihood(kernel_from_spectrum(&[-1e-15, 1.0, 2.0], &v));

    compute_spectral_sampler_parameters(&mut dpp, 2).unwrap();
    let vals = dpp.l_eig_vals.as_ref().unwrap();
    assert!(vals.iter().all(|&v| v >= 0.0));
    assert!(vals[0] < 1e-12);

    // the noise direction never carries weight downstream
    let vecs = dpp.eig_vecs.as_ref().unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..200 {
        let sel = select_eigen_vectors_k_dpp(vals, vecs, 2, dpp.esp.as_ref(), &mut rng).unwrap();
        assert_eq!(sel.indices, vec![1, 2]);
    }
}

#[test]
fn test_empty_descriptor_is_configuration_error() {
    init();
    let mut dpp = FiniteDpp::likelihood(DenseMatrix::from_2d_vec(&vec![vec![1.0]]).unwrap());
    dpp.l = None;

    assert_eq!(Representation::detect(&dpp), None);
    let err = compute_spectral_sampler_parameters(&mut dpp, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_representation_priority() {
    init();
    let v = random_orthonormal(3, 3, 2);
    let mut dpp = FiniteDpp::likelihood(kernel_from_spectrum(&[1.0, 2.0, 3.0], &v));
    dpp.k = Some(kernel_from_spectrum(&[0.1, 0.2, 0.3], &v));
    assert_eq!(Representation::detect(&dpp), Some(Representation::Likelihood));

    dpp.k_eig_vals = Some(vec![0.1, 0.2, 0.3]);
    assert_eq!(Representation::detect(&dpp), Some(Representation::CorrelationEigen));

    dpp.l_eig_vals = Some(vec![1.0, 2.0, 3.0]);
    assert_eq!(Representation::detect(&dpp), Some(Representation::LikelihoodEigen));
}
