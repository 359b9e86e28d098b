//! End-to-end use of batches with the kernel dispatch

use approx::assert_relative_eq;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tessera::prelude::*;
use tracing::info_span;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    // Several tests race to install the subscriber; only the first wins
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn points() -> Vec<DenseVector<f64>> {
    vec![
        DenseVector::from_slice(&[1.0, 2.0]),
        DenseVector::from_slice(&[3.0, 4.0]),
        DenseVector::from_slice(&[0.0, 1.0]),
    ]
}

#[test]
fn test_gram_matrix_of_batch() -> anyhow::Result<()> {
    init_tracing();
    let batch = Batch::create_from_range(&points())?;

    let mut gram = DenseMatrix::<f64>::new(3, 3);
    syrk::<Upper, _, _>(&batch, &mut gram, 1.0)?.wait()?;
    assert_eq!(
        gram.as_slice(),
        &[5.0, 11.0, 2.0, 0.0, 25.0, 4.0, 0.0, 0.0, 1.0]
    );

    // Off-diagonal entries agree with pairwise dots of the slots
    let first = BatchAggregate::get(&batch, 0).unwrap();
    let second = BatchAggregate::get(&batch, 1).unwrap();
    assert_relative_eq!(inner(&first, &second)?, gram[(0, 1)]);
    Ok(())
}

#[test]
fn test_gram_matrix_on_device() -> anyhow::Result<()> {
    init_tracing();
    let queue = Queue::with_defaults()?;
    let batch = Batch::create_from_range(&points())?;
    let a = DenseMatrix::<f64, Device>::upload(&queue, &batch)?;
    let mut c = DenseMatrix::<f64, Device>::zeros(&queue, 3, 3)?;

    let pending = syrk::<Lower, _, _>(&a, &mut c, 2.0)?;
    // Reads go through the queue, after the update
    let lower = c.to_vec()?;
    pending.wait()?;
    assert_eq!(
        lower,
        vec![10.0, 0.0, 0.0, 22.0, 50.0, 0.0, 4.0, 8.0, 2.0]
    );
    Ok(())
}

#[test]
fn test_sparse_batch_densifies_for_kernels() -> anyhow::Result<()> {
    init_tracing();
    let sparse: Vec<CompressedVector<f64>> = points()
        .iter()
        .map(|p| CompressedVector::from_dense(p.as_slice()))
        .collect();
    let batch = Batch::create_from_range(&sparse)?;
    assert_eq!(batch.nnz(), 5);

    let dense = batch.to_dense();
    let mut gram = DenseMatrix::<f64>::new(3, 3);
    syrk::<Upper, _, _>(&dense, &mut gram, 1.0)?;
    assert_eq!(gram[(0, 1)], 11.0);
    assert_eq!(gram[(2, 2)], 1.0);
    Ok(())
}

#[test]
fn test_random_batch_gram_matches_pairwise_dots() -> anyhow::Result<()> {
    init_tracing();
    let _span = info_span!("random_gram", seed = 42).entered();

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let (slots, dim) = (6, 9);
    let vectors: Vec<DenseVector<f64>> = (0..slots)
        .map(|_| (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect();
    let batch = Batch::create_from_range(&vectors)?;

    let mut gram = DenseMatrix::<f64>::new(slots, slots);
    syrk::<Lower, _, _>(&batch, &mut gram, 0.5)?;

    for i in 0..slots {
        for j in 0..slots {
            let left = BatchAggregate::get(&batch, i).unwrap();
            let right = BatchAggregate::get(&batch, j).unwrap();
            let expected = if j <= i { 0.5 * inner(&left, &right)? } else { 0.0 };
            assert_relative_eq!(gram[(i, j)], expected, epsilon = 1e-12);
        }
    }
    Ok(())
}

#[test]
fn test_shape_errors_surface_through_facade() {
    init_tracing();
    let batch = Batch::create_from_range(&points()).unwrap();
    let mut wrong = DenseMatrix::<f64>::new(2, 2);
    let err = syrk::<Upper, _, _>(&batch, &mut wrong, 1.0).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. }));
    assert_eq!(wrong.as_slice(), &[0.0; 4]);
}
