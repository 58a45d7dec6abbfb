//! Benchmarks for engine crossfading and interleaving.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use roomverb::dsp::mix::{crossfade, interleave};

use crate::BLOCK_SIZES;

pub fn bench_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/mix");

    for &size in BLOCK_SIZES {
        let fdn: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();
        let ism: Vec<f32> = (0..size).map(|i| (i as f32 * 0.07).cos()).collect();

        group.bench_with_input(BenchmarkId::new("crossfade", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for (&f, &e) in fdn.iter().zip(&ism) {
                    sum += crossfade(f, e, black_box(0.4));
                }
                sum
            })
        });

        let channels = vec![fdn.clone(); 8];
        let mut out = vec![0.0f32; size * 8];
        group.bench_with_input(BenchmarkId::new("interleave_8ch", size), &size, |b, _| {
            b.iter(|| interleave(black_box(&channels), size, &mut out))
        });
    }

    group.finish();
}
