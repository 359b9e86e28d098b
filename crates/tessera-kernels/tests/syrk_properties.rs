//! Property-based tests for the symmetric rank-k update
//!
//! Checked on both backends: the declared half matches a naive
//! `C + alpha * A * Aᵀ`, the other half and an `alpha = 0` update leave `C`
//! alone, and shape errors never touch `C`.

mod common;

use common::*;
use proptest::prelude::*;
use tessera_core::{
    ColumnMajor, DenseMatrix, Device, Error, Host, Lower, Orientation, Queue, RowMajor, Triangle,
    TriangleTag, Upper,
};
use tessera_kernels::syrk;

fn check_host<Tri: TriangleTag, OA: Orientation, OC: Orientation>(
    seed: u64,
    n: usize,
    k: usize,
    alpha: f64,
) {
    let mut rng = rng(seed);
    let a = random_matrix::<OA>(&mut rng, n, k);
    let mut c = random_matrix::<OC>(&mut rng, n, n);
    let before = c.clone();
    let expected = expected_update(&a, &before, alpha);

    syrk::<Tri, _, _>(&a, &mut c, alpha).unwrap().wait().unwrap();

    for i in 0..n {
        for j in 0..n {
            if Tri::TRIANGLE.contains(i, j) {
                assert_relative_eq!(c[(i, j)], expected[i * n + j], epsilon = EPSILON);
            } else {
                assert_eq!(c[(i, j)], before[(i, j)]);
            }
        }
    }
}

#[test]
fn test_every_orientation_pairing() {
    for (n, k) in [(1, 1), (3, 2), (4, 7), (9, 3)] {
        check_host::<Upper, RowMajor, RowMajor>(1, n, k, 1.5);
        check_host::<Lower, RowMajor, ColumnMajor>(2, n, k, -0.5);
        check_host::<Upper, ColumnMajor, RowMajor>(3, n, k, 2.0);
        check_host::<Lower, ColumnMajor, ColumnMajor>(4, n, k, 1.0);
    }
}

#[test]
fn test_zero_inner_dimension_is_noop() {
    let a = DenseMatrix::<f64>::new(3, 0);
    let mut c = DenseMatrix::<f64>::from_fn(3, 3, |i, j| (i * 3 + j) as f64).unwrap();
    let before = c.clone();
    syrk::<Upper, _, _>(&a, &mut c, 4.0).unwrap();
    assert_eq!(c, before);
}

#[test]
fn test_device_matches_host() {
    let queue = Queue::with_defaults().unwrap();
    let mut rng = rng(42);
    let a = random_matrix::<ColumnMajor>(&mut rng, 6, 4);
    let c = random_matrix::<RowMajor>(&mut rng, 6, 6);

    let mut host_c = c.clone();
    syrk::<Lower, _, _>(&a, &mut host_c, 0.75).unwrap();

    let device_a = DenseMatrix::<f64, Device, ColumnMajor>::upload(&queue, &a).unwrap();
    let mut device_c = DenseMatrix::<f64, Device, RowMajor>::upload(&queue, &c).unwrap();
    syrk::<Lower, _, _>(&device_a, &mut device_c, 0.75)
        .unwrap()
        .wait()
        .unwrap();

    let device_result = device_c.to_vec().unwrap();
    for (got, want) in device_result.iter().zip(host_c.as_slice()) {
        assert_relative_eq!(*got, *want, epsilon = EPSILON);
    }
}

#[test]
fn test_mismatch_issues_nothing_on_device() {
    let queue = Queue::with_defaults().unwrap();
    let a = DenseMatrix::<f64, Device>::zeros(&queue, 2, 3).unwrap();
    let mut c = DenseMatrix::<f64, Device>::from_vec(&queue, 3, 3, vec![1.0; 9]).unwrap();
    let submitted = queue.submitted();

    let err = syrk::<Upper, _, _>(&a, &mut c, 1.0).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. }));
    assert_eq!(queue.submitted(), submitted);
    assert_eq!(c.to_vec().unwrap(), vec![1.0; 9]);
}

proptest! {
    // Property: alpha = 0 leaves C unchanged on both halves
    #[test]
    fn prop_zero_alpha_is_identity(seed in any::<u64>(), n in 1usize..8, k in 0usize..8) {
        let mut rng = rng(seed);
        let a = random_matrix::<RowMajor>(&mut rng, n, k);
        let mut c = random_matrix::<ColumnMajor>(&mut rng, n, n);
        let before = c.clone();
        syrk::<Upper, _, _>(&a, &mut c, 0.0).unwrap();
        prop_assert_eq!(c, before);
    }

    // Property: declared half equals C + alpha * A * Aᵀ, other half untouched
    #[test]
    fn prop_declared_half_only(
        seed in any::<u64>(),
        n in 1usize..10,
        k in 1usize..10,
        alpha in -2.0f64..2.0,
        upper in any::<bool>(),
    ) {
        let mut rng = rng(seed);
        let a = random_matrix::<RowMajor>(&mut rng, n, k);
        let mut c = random_matrix::<RowMajor>(&mut rng, n, n);
        let before = c.clone();
        let expected = expected_update(&a, &before, alpha);

        let triangle = if upper {
            syrk::<Upper, _, _>(&a, &mut c, alpha).unwrap();
            Triangle::Upper
        } else {
            syrk::<Lower, _, _>(&a, &mut c, alpha).unwrap();
            Triangle::Lower
        };

        for i in 0..n {
            for j in 0..n {
                if triangle.contains(i, j) {
                    prop_assert!((c[(i, j)] - expected[i * n + j]).abs() < 1e-9);
                } else {
                    prop_assert_eq!(c[(i, j)], before[(i, j)]);
                }
            }
        }
    }

    // Property: A.rows != C.rows fails before C is touched
    #[test]
    fn prop_row_mismatch_fails_without_mutation(
        seed in any::<u64>(),
        n in 1usize..8,
        extra in 1usize..4,
        k in 1usize..5,
    ) {
        let mut rng = rng(seed);
        let a = random_matrix::<RowMajor>(&mut rng, n + extra, k);
        let mut c = random_matrix::<RowMajor>(&mut rng, n, n);
        let before = c.clone();
        let result = syrk::<Lower, _, _>(&a, &mut c, 1.0);
        let is_mismatch = matches!(result, Err(Error::DimensionMismatch { .. }));
        prop_assert!(is_mismatch);
        prop_assert_eq!(c, before);
    }
}

#[test]
fn test_host_type_is_default_backend() {
    // DenseMatrix<f64> is a host matrix, so syrk dispatches to Host
    let a: DenseMatrix<f64, Host, RowMajor> = DenseMatrix::from_fn(2, 1, |i, _| i as f64 + 1.0).unwrap();
    let mut c = DenseMatrix::<f64>::new(2, 2);
    let done = syrk::<Upper, _, _>(&a, &mut c, 1.0).unwrap();
    assert!(done.is_complete());
    assert!(done.event().is_none());
    assert_eq!(c.as_slice(), &[1.0, 2.0, 0.0, 4.0]);
}
