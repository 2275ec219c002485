//! Elementary symmetric polynomial (ESP) tables.
//!
//! `e_i(λ_1..λ_n)` is the sum over all i-subsets of the product of their
//! values. The table stores it for every prefix `λ_1..λ_n` so that the
//! eigenvector selector can read the normalising weight of "choose i from the
//! first n" in O(1).

use log::debug;

/// Triangular table `esp[i][n]`, `0 ≤ i ≤ size`, `0 ≤ n ≤ N`.
///
/// Boundary convention: `esp[0][n] = 1` for every n and `esp[i][n] = 0`
/// whenever `i > n`.
///
/// The table may be built from eigenvalues divided by a common `scale`; the
/// ratios the selector reads are unchanged by it.
#[derive(Debug, Clone, PartialEq)]
pub struct EspTable {
    size: usize,
    n: usize,
    scale: f64,
    values: Vec<f64>,
}

impl EspTable {
    /// Largest polynomial order stored.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of eigenvalues the table was computed from.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Factor the eigenvalues were divided by before building the table.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// `e_i(λ_1/s..λ_n/s)` with `s = scale()`, `None` outside the table.
    pub fn get(&self, i: usize, n: usize) -> Option<f64> {
        if i > self.size || n > self.n {
            return None;
        }
        self.values.get(i * (self.n + 1) + n).copied()
    }

    /// True if the table can serve a selection of `size` items out of `n`.
    pub fn covers(&self, size: usize, n: usize) -> bool {
        self.size >= size && self.n == n
    }
}

/// Compute `e_0..e_size` on every prefix of `eig_vals` with the recurrence
/// `E[l][n] = E[l][n-1] + λ_{n-1} E[l-1][n-1]`.
pub fn elementary_symmetric_polynomials(eig_vals: &[f64], size: usize) -> EspTable {
    build(eig_vals, size, 1.0)
}

/// Same table over `λ / max(λ)`, which keeps every entry below `C(N, i)`
/// where the raw products would overflow.
pub fn normalized_elementary_symmetric_polynomials(eig_vals: &[f64], size: usize) -> EspTable {
    let max = eig_vals.iter().copied().fold(0.0_f64, f64::max);
    let scale = if max.is_finite() && max > 0.0 { max } else { 1.0 };
    build(eig_vals, size, scale)
}

fn build(eig_vals: &[f64], size: usize, scale: f64) -> EspTable {
    let n = eig_vals.len();
    debug!(
        "Computing ESP table: orders 0..={} over {} eigenvalues (scale={:e})",
        size, n, scale
    );

    let width = n + 1;
    let mut values = vec![0.0; (size + 1) * width];
    values[..width].fill(1.0);

    for l in 1..=size {
        for m in 1..=n {
            let lambda = eig_vals[m - 1] / scale;
            values[l * width + m] =
                values[l * width + m - 1] + lambda * values[(l - 1) * width + m - 1];
        }
    }

    EspTable {
        size,
        n,
        scale,
        values,
    }
}
