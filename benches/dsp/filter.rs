//! Benchmarks for the state-variable filter and the three-band crossover.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use roomverb::dsp::{Crossover, SVFilter};

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");
    let sample_rate = 48_000.0;

    for &size in BLOCK_SIZES {
        // Generate a test signal (sawtooth-like ramp)
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        let mut filter = SVFilter::butterworth(1000.0, sample_rate);
        group.bench_with_input(BenchmarkId::new("svf", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for &sample in &input {
                    sum += filter.next_sample(black_box(sample)).lowpass;
                }
                sum
            })
        });

        let mut crossover = Crossover::new(300.0, 3000.0, sample_rate);
        group.bench_with_input(BenchmarkId::new("crossover", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for &sample in &input {
                    let [low, mid, high] = crossover.process(black_box(sample));
                    sum += low + mid + high;
                }
                sum
            })
        });
    }

    group.finish();
}
