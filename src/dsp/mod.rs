//! Low-level DSP primitives used by the reverb engines.
//!
//! These components allocate only on construction and are realtime-safe
//! afterwards. They stay focused on the signal-processing math so the
//! engines can layer geometry and control on top.

/// Fixed-capacity delay line.
pub mod delay;
/// State-variable filter and three-band crossover.
pub mod filter;
/// Delay line with per-band decay weights.
pub mod filtered_delay;
/// Dense matrices and Hadamard construction.
pub mod matrix;
/// Engine cross-mix and interleaving.
pub mod mix;
/// Per-(channel, order) tap storage.
pub mod multitap;
/// Linear parameter ramps.
pub mod smoothing;

pub use delay::DelayLine;
pub use filter::{Crossover, SVFilter};
pub use filtered_delay::FilteredDelay;
pub use matrix::Matrix;
pub use multitap::{Tap, TapTable};
pub use smoothing::LinearRamp;
