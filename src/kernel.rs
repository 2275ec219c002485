//! Pointwise kernel evaluation for out-of-core likelihood kernels.
//!
//! A DPP can be specified by a kernel function plus raw data points instead
//! of a dense matrix. The resolver materialises `L[i][j] = k(x_i, x_j)` over
//! the rows of `x_data` only when it has nothing better to work with.

use log::debug;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::Result;

/// A positive semi-definite kernel on feature vectors.
pub trait KernelEval: Send + Sync {
    fn eval(&self, x: &[f64], y: &[f64]) -> f64;

    /// Dense Gram matrix over the rows of `x_data`.
    fn gram(&self, x_data: &DenseMatrix<f64>) -> Result<DenseMatrix<f64>> {
        let (n, f) = x_data.shape();
        debug!("Materialising {}×{} kernel over {} features", n, n, f);

        let rows: Vec<Vec<f64>> = (0..n)
            .map(|i| (0..f).map(|c| *x_data.get((i, c))).collect())
            .collect();

        let mut values = vec![0.0; n * n];
        for i in 0..n {
            for j in i..n {
                let v = self.eval(&rows[i], &rows[j]);
                values[i * n + j] = v;
                values[j * n + i] = v;
            }
        }
        Ok(DenseMatrix::new(n, n, values, false)?)
    }
}

impl<F> KernelEval for F
where
    F: Fn(&[f64], &[f64]) -> f64 + Send + Sync,
{
    fn eval(&self, x: &[f64], y: &[f64]) -> f64 {
        self(x, y)
    }
}

/// Gaussian (RBF) kernel `exp(-‖x - y‖² / (2σ²))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianKernel {
    pub bandwidth: f64,
}

impl Default for GaussianKernel {
    fn default() -> Self {
        Self { bandwidth: 1.0 }
    }
}

impl GaussianKernel {
    pub fn new(bandwidth: f64) -> Self {
        Self { bandwidth }
    }
}

impl KernelEval for GaussianKernel {
    fn eval(&self, x: &[f64], y: &[f64]) -> f64 {
        let sq: f64 = x.iter().zip(y).map(|(a, b)| (a - b) * (a - b)).sum();
        (-sq / (2.0 * self.bandwidth * self.bandwidth)).exp()
    }
}
