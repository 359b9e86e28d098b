//! Shared utilities for integration tests

#![allow(dead_code)]

pub use approx::assert_relative_eq;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tessera_core::{DenseMatrix, Host, Orientation};

pub const EPSILON: f64 = 1e-10;

/// Deterministic generator for reproducible matrices
pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// `rows x cols` matrix with entries uniform in [-1, 1)
pub fn random_matrix<O: Orientation>(
    rng: &mut ChaCha8Rng,
    rows: usize,
    cols: usize,
) -> DenseMatrix<f64, Host, O> {
    DenseMatrix::from_fn(rows, cols, |_, _| rng.gen_range(-1.0..1.0)).unwrap()
}

/// `C + alpha * A * Aᵀ` computed naively, full matrix, row-major
pub fn expected_update<OA: Orientation, OC: Orientation>(
    a: &DenseMatrix<f64, Host, OA>,
    c: &DenseMatrix<f64, Host, OC>,
    alpha: f64,
) -> Vec<f64> {
    let (n, k) = a.shape();
    let mut out = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            let product: f64 = (0..k).map(|p| a[(i, p)] * a[(j, p)]).sum();
            out.push(c[(i, j)] + alpha * product);
        }
    }
    out
}

/// Generate test vectors with a specific pattern
pub fn generate_test_data(len: usize) -> Vec<f64> {
    (0..len).map(|i| i as f64 + 0.1).collect()
}

/// Complementary data for binary operations
pub fn generate_test_data_complement(len: usize) -> Vec<f64> {
    (0..len).map(|i| (len - i) as f64 + 0.2).collect()
}

/// Lengths around the SIMD widths of the host primitives
pub fn edge_case_lengths() -> Vec<usize> {
    vec![0, 1, 2, 3, 4, 5, 7, 8, 9, 15, 16, 17, 31, 32, 63, 64, 100]
}
