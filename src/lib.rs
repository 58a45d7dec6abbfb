//! Realtime room reverberation.
//!
//! Two engines share one moving source and one listener inside a
//! rectangular room:
//!
//! - [`reverb::Fdn`]: a feedback delay network for the statistical late tail
//! - [`reverb::IsmVerb`]: an image-source model for the discrete early
//!   reflections
//!
//! [`reverb::DynamicFdn`] owns both, mixes them onto a ring of output
//! channels around the listener and takes live parameter changes from a
//! [`control::ReverbControl`] handle.

pub mod config;
pub mod control; // Lock-free parameter and scene plumbing
pub mod dsp;
pub mod error;
pub mod geometry; // Vectors, planes, rooms and mirror sources
pub mod reverb;

pub use config::ReverbConfig;
pub use control::{ReverbControl, SceneEvent};
pub use error::{Result, ReverbError};
pub use reverb::{AudioRender, DynamicFdn, Fdn, IsmVerb};

pub const MAX_BLOCK_SIZE: usize = 2048;
/// Speed of sound in air, m/s.
pub const SPEED_OF_SOUND: f32 = 343.0;
/// Frequency bands of every decay filter bank (low, mid, high).
pub const N_BANDS: usize = 3;
pub const DEFAULT_CHANNELS: usize = 8;
