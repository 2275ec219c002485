mod test_resolver;

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::linalg::{qr_economic, reconstruct, to_dense};

/// Initialize logging for tests
pub(crate) fn init() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// `n × r` matrix with orthonormal columns, reproducible from `seed`.
pub(crate) fn random_orthonormal(n: usize, r: usize, seed: u64) -> DMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let raw = DMatrix::from_fn(n, r, |_, _| rng.random_range(-1.0..1.0));
    qr_economic(&raw)
}

/// `V diag(vals) Vᵀ` as a smartcore matrix.
pub(crate) fn kernel_from_spectrum(vals: &[f64], vecs: &DMatrix<f64>) -> DenseMatrix<f64> {
    to_dense(&reconstruct(vals, vecs)).unwrap()
}

pub(crate) fn is_distinct_in_range(sample: &[usize], n: usize) -> bool {
    let mut sorted = sample.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len() == sample.len() && sample.iter().all(|&i| i < n)
}
