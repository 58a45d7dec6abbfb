//! Benchmarks for the FDN feedback matrix.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use roomverb::dsp::Matrix;

pub fn bench_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/matrix");

    for n in [8, 16, 24, 32] {
        let Ok(matrix) = Matrix::hadamard(n) else {
            continue;
        };
        let input: Vec<f32> = (0..n).map(|i| (i as f32 * 0.3).sin()).collect();
        let mut out = vec![0.0f32; n];

        // One matrix-vector product per sample of a 128-sample block
        group.bench_with_input(BenchmarkId::new("hadamard_apply", n), &n, |b, _| {
            b.iter(|| {
                for _ in 0..128 {
                    matrix.apply(black_box(&input), &mut out);
                }
                out[0]
            })
        });
    }

    group.finish();
}
