//! Engine construction parameters.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, ReverbError};
use crate::geometry::Vector3D;
use crate::{DEFAULT_CHANNELS, MAX_BLOCK_SIZE, N_BANDS};

/// Everything needed to build a [`DynamicFdn`](crate::reverb::DynamicFdn).
///
/// Values that can change while rendering (gain, mix, T60, crossovers, room,
/// positions) are only the starting point; afterwards they live in the
/// shared control state.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct ReverbConfig {
    pub sample_rate: f32,
    /// Largest sub-block rendered at once; also the control-rate period.
    pub block_size: usize,
    pub n_channels: usize,
    /// Must be a power of two or 24.
    pub fdn_paths: usize,
    pub ism_order: usize,
    /// Seed for the FDN delay jitter. `None` draws one from the OS.
    pub seed: Option<u64>,

    pub gain: f32,
    /// 1.0 = FDN only, 0.0 = image sources only.
    pub mix: f32,
    pub fdn_gain: f32,
    pub ism_gain: f32,
    /// Reverberation time per band in seconds.
    pub t60: [f32; N_BANDS],
    pub max_t60: f32,
    /// Band edges in Hz, ascending.
    pub crossovers: [f32; 2],

    pub room: [f32; 3],
    pub min_room_extent: f32,
    /// Sizes every delay line; the room can never grow past it.
    pub max_room_extent: f32,
    pub source: Vector3D,
    pub listener: Vector3D,

    /// Radius of the reverb-source ring around the listener, meters.
    pub ring_radius: f32,
    /// Length of the gain/mix ramps in samples.
    pub ramp_samples: usize,
}

impl Default for ReverbConfig {
    fn default() -> Self {
        let room = [5.0, 7.0, 3.2];
        Self {
            sample_rate: 48_000.0,
            block_size: 1024,
            n_channels: DEFAULT_CHANNELS,
            fdn_paths: 24,
            ism_order: 4,
            seed: None,
            gain: 1.0,
            mix: 0.5,
            fdn_gain: 1.0,
            ism_gain: 1.0,
            t60: [2.0, 1.0, 0.2],
            max_t60: 8.0,
            crossovers: [300.0, 3000.0],
            room,
            min_room_extent: 1.0,
            max_room_extent: 30.0,
            source: Vector3D::new(room[0] / 3.0, room[1] / 3.0, room[2] / 3.0),
            listener: Vector3D::new(room[0] / 2.0, room[1] / 2.0, room[2] / 2.0),
            ring_radius: 1.2,
            ramp_samples: 256,
        }
    }
}

impl ReverbConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_channels(mut self, n_channels: usize) -> Self {
        self.n_channels = n_channels;
        self
    }

    pub fn with_fdn_paths(mut self, paths: usize) -> Self {
        self.fdn_paths = paths;
        self
    }

    pub fn with_ism_order(mut self, order: usize) -> Self {
        self.ism_order = order;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_room(mut self, x: f32, y: f32, z: f32) -> Self {
        self.room = [x, y, z];
        self
    }

    pub fn with_source(mut self, source: Vector3D) -> Self {
        self.source = source;
        self
    }

    pub fn with_listener(mut self, listener: Vector3D) -> Self {
        self.listener = listener;
        self
    }

    pub fn with_t60(mut self, t60: [f32; N_BANDS]) -> Self {
        self.t60 = t60;
        self
    }

    pub fn with_mix(mut self, mix: f32) -> Self {
        self.mix = mix;
        self
    }

    pub fn nyquist(&self) -> f32 {
        self.sample_rate * 0.5
    }

    /// Check the structural parameters. Runtime values (gain, mix, T60) are
    /// clamped on use instead.
    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ReverbError::InvalidSampleRate(self.sample_rate));
        }
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(ReverbError::InvalidBlockSize(self.block_size));
        }
        if self.n_channels == 0 {
            return Err(ReverbError::InvalidChannelCount(self.n_channels));
        }
        if !(self.fdn_paths.is_power_of_two() || self.fdn_paths == 24) {
            return Err(ReverbError::InvalidPathCount(self.fdn_paths));
        }
        if self.ism_order == 0 {
            return Err(ReverbError::InvalidOrder(self.ism_order));
        }
        if !(self.min_room_extent > 0.0 && self.min_room_extent <= self.max_room_extent) {
            return Err(ReverbError::InvalidConfig(format!(
                "room extent bounds {}..{} m",
                self.min_room_extent, self.max_room_extent
            )));
        }
        let [x, y, z] = self.room;
        if self.room.iter().any(|&e| {
            !(e.is_finite() && e >= self.min_room_extent && e <= self.max_room_extent)
        }) {
            return Err(ReverbError::InvalidRoom { x, y, z });
        }
        if !(self.source.is_finite() && self.listener.is_finite()) {
            return Err(ReverbError::InvalidConfig(format!(
                "source {} and listener {} must be finite",
                self.source, self.listener
            )));
        }
        if !(self.ring_radius.is_finite() && self.ring_radius > 0.0) {
            return Err(ReverbError::InvalidConfig(format!(
                "ring radius {} m must be positive",
                self.ring_radius
            )));
        }
        if !(self.crossovers[0] > 0.0
            && self.crossovers[0] < self.crossovers[1]
            && self.crossovers[1] < self.nyquist())
        {
            return Err(ReverbError::InvalidConfig(format!(
                "crossovers {:?} must ascend below {} Hz",
                self.crossovers,
                self.nyquist()
            )));
        }
        if !(self.max_t60 > 0.0) {
            return Err(ReverbError::InvalidConfig(format!(
                "max_t60 {} must be positive",
                self.max_t60
            )));
        }
        Ok(())
    }
}
