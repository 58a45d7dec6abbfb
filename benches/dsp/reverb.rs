//! Benchmarks for the two reverb engines on their own.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use roomverb::geometry::{Room, Vector3D};
use roomverb::{Fdn, IsmVerb};

use crate::BLOCK_SIZES;

pub fn bench_reverb(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/reverb");

    let sample_rate = 48_000.0;

    for &size in BLOCK_SIZES {
        // Generate a test signal (impulse-like with some content)
        let input: Vec<f32> = (0..size)
            .map(|i| {
                if i < 10 {
                    1.0 - (i as f32 / 10.0)
                } else {
                    (i as f32 * 0.05).sin() * 0.1
                }
            })
            .collect();
        let mut outputs = vec![vec![0.0f32; size]; 8];

        for paths in [16, 24] {
            let Ok(mut fdn) = Fdn::new(sample_rate, paths, 8, [300.0, 3000.0], 30.0, Some(1)) else {
                continue;
            };
            fdn.set_room(5.0, 7.0, 3.2);
            group.bench_with_input(
                BenchmarkId::new(format!("fdn_{}", paths), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        for out in outputs.iter_mut() {
                            out.fill(0.0);
                        }
                        fdn.process(black_box(&input), &mut outputs);
                    })
                },
            );
        }

        for order in [2, 4] {
            let Ok(room) = Room::new(5.0, 7.0, 3.2) else {
                continue;
            };
            let Ok(mut ism) = IsmVerb::new(room, order, sample_rate, 512, 8, 48_000, [300.0, 3000.0]) else {
                continue;
            };
            ism.set_source(Vector3D::new(1.5, 2.0, 1.2));
            ism.set_listener(Vector3D::new(2.5, 3.5, 1.6));
            ism.refresh();
            group.bench_with_input(
                BenchmarkId::new(format!("ism_order_{}", order), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        for out in outputs.iter_mut() {
                            out.fill(0.0);
                        }
                        ism.process(black_box(&input), &mut outputs);
                    })
                },
            );
        }
    }

    group.finish();
}
