//! Whole-engine scenario benchmarks.
//!
//! These run the complete reverb the way a host would: one mono input, eight
//! output channels, parameters changing between blocks.

mod room;

pub use room::bench_room;
