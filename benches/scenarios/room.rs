//! Benchmarks for the full engine in a living-room sized space.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use roomverb::geometry::Vector3D;
use roomverb::{DynamicFdn, ReverbConfig};

use crate::BLOCK_SIZES;

pub fn bench_room(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/room");

    for &size in BLOCK_SIZES {
        let config = ReverbConfig::default()
            .with_sample_rate(48_000.0)
            .with_block_size(size)
            .with_seed(1);
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
        let mut outputs = vec![vec![0.0f32; size]; config.n_channels];

        // === STATIC: source and listener never move ===
        let Ok((mut engine, _control)) = DynamicFdn::new(config.clone()) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::new("static", size), &size, |b, _| {
            b.iter(|| engine.process(black_box(&input), &mut outputs))
        });

        // === MOVING: new source position every block, full image refresh ===
        let Ok((mut engine, control)) = DynamicFdn::new(config.clone()) else {
            continue;
        };
        let mut step = 0u32;
        group.bench_with_input(BenchmarkId::new("moving_source", size), &size, |b, _| {
            b.iter(|| {
                step = step.wrapping_add(1);
                let t = (step % 100) as f32 / 100.0;
                control.set_source_position(Vector3D::new(1.0 + 3.0 * t, 2.0, 1.2));
                engine.process(black_box(&input), &mut outputs);
            })
        });

        // === INTERLEAVED: host-style output buffer ===
        let Ok((mut engine, _control)) = DynamicFdn::new(config.clone()) else {
            continue;
        };
        let mut interleaved = vec![0.0f32; size * config.n_channels];
        group.bench_with_input(BenchmarkId::new("interleaved", size), &size, |b, _| {
            b.iter(|| engine.render_interleaved(black_box(&input), &mut interleaved))
        });
    }

    group.finish();
}
