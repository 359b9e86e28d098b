//! Benchmarks for host syrk and dot, scalar vs AVX2 primitives and
//! sequential vs parallel execution

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tessera_core::{
    DenseMatrix, DenseVector, ExecutionStrategy, HostContext, Layout, Transpose, Triangle, Upper,
};
use tessera_kernels::{
    inner, native, syrk, Avx2Primitives, DotPrimitives, ScalarPrimitives,
};

/// Generate test data with specific patterns
fn generate_test_data(size: usize) -> Vec<f64> {
    (0..size).map(|i| (i as f64 * 0.1).sin() * 100.0).collect()
}

fn bench_dot_primitives(c: &mut Criterion) {
    let mut group = c.benchmark_group("dot_primitives");

    for &size in &[16usize, 256, 4096, 65536] {
        let a = generate_test_data(size);
        let b = generate_test_data(size + 1)[1..].to_vec();

        let scalar = ScalarPrimitives;
        group.bench_with_input(BenchmarkId::new("scalar", size), &size, |bench, _| {
            bench.iter(|| black_box(DotPrimitives::<f64>::dot_product(&scalar, &a, &b)));
        });

        let avx2 = Avx2Primitives::detect();
        if Avx2Primitives::is_available() {
            group.bench_with_input(BenchmarkId::new("avx2", size), &size, |bench, _| {
                bench.iter(|| black_box(DotPrimitives::<f64>::dot_product(&avx2, &a, &b)));
            });
        }
    }

    group.finish();
}

fn bench_dot_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dot_dispatch");

    for &size in &[256usize, 65536] {
        let x = DenseVector::from_slice(&generate_test_data(size));
        let y = DenseVector::from_slice(&generate_test_data(size));
        group.bench_with_input(BenchmarkId::new("host", size), &size, |bench, _| {
            bench.iter(|| black_box(inner(&x, &y).ok()));
        });
    }

    group.finish();
}

fn bench_syrk(c: &mut Criterion) {
    let mut group = c.benchmark_group("syrk");
    group.sample_size(20);

    for &(n, k) in &[(32usize, 32usize), (128, 64), (256, 256)] {
        let a = DenseMatrix::<f64>::from_fn(n, k, |i, j| ((i * k + j) as f64 * 0.01).cos())
            .unwrap();

        for (name, strategy) in [
            ("sequential", ExecutionStrategy::Sequential),
            ("parallel", ExecutionStrategy::Parallel),
        ] {
            let context = HostContext::default().with_strategy(strategy);
            let mut out = DenseMatrix::<f64>::new(n, n).with_context(context);
            group.bench_with_input(
                BenchmarkId::new(name, format!("{n}x{k}")),
                &(n, k),
                |bench, _| {
                    bench.iter(|| black_box(syrk::<Upper, _, _>(&a, &mut out, 1.0).is_ok()));
                },
            );
        }

        // Native entry point, without expression dispatch
        let packed = a.as_slice().to_vec();
        let mut raw = vec![0.0; n * n];
        group.bench_with_input(
            BenchmarkId::new("native", format!("{n}x{k}")),
            &(n, k),
            |bench, _| {
                bench.iter(|| {
                    black_box(native::host::syrk(
                        &HostContext::sequential(),
                        Layout::RowMajor,
                        Triangle::Upper,
                        Transpose::No,
                        n,
                        k,
                        1.0,
                        &packed,
                        0,
                        k,
                        1.0,
                        &mut raw,
                        0,
                        n,
                    ))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_dot_primitives, bench_dot_dispatch, bench_syrk);
criterion_main!(benches);
