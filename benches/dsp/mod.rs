//! Benchmarks for low-level DSP primitives.

mod delay;
mod filter;
mod matrix;
mod mix;
mod reverb;

pub use delay::bench_delay;
pub use filter::bench_filter;
pub use matrix::bench_matrix;
pub use mix::bench_mix;
pub use reverb::bench_reverb;
